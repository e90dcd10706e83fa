//! Predict Route

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use predictor::PredictionResult;

/// Response for a successful prediction
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: PredictionBody,
    pub filename: Option<String>,
}

/// Wire form of a prediction. `all_predictions` is a JSON object whose keys
/// iterate in descending probability order.
#[derive(Debug, Serialize)]
pub struct PredictionBody {
    pub predicted_class: String,
    pub confidence: f32,
    pub all_predictions: Map<String, Value>,
}

impl From<PredictionResult> for PredictionBody {
    fn from(result: PredictionResult) -> Self {
        let mut all_predictions = Map::new();
        for entry in &result.all_predictions {
            all_predictions.insert(entry.class.clone(), Value::from(entry.probability as f64));
        }
        Self {
            predicted_class: result.predicted_class,
            confidence: result.confidence,
            all_predictions,
        }
    }
}

/// One uploaded file from the multipart form
struct Upload {
    filename: Option<String>,
    content: Vec<u8>,
}

/// Classify an uploaded image.
///
/// The empty-file check runs before the registry is touched, so a zero-byte
/// upload is rejected without ever invoking the network.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    if upload.content.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    let registry = state.registry().ok_or(ApiError::ModelNotLoaded)?;

    let tensor = preprocessor::preprocess(&upload.content)?;
    let result = predictor::predict(registry, tensor)?;
    info!("Prediction successful: {}", result.predicted_class);

    Ok(Json(PredictResponse {
        success: true,
        prediction: PredictionBody::from(result),
        filename: upload.filename,
    }))
}

/// Pull the `file` field out of the multipart form
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let content = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadUpload(e.to_string()))?
                .to_vec();
            return Ok(Upload { filename, content });
        }
    }

    Err(ApiError::BadUpload("no file field in form".to_string()))
}
