//! Request error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use predictor::PredictionError;
use preprocessor::PreprocessError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a request handler can surface to the client.
///
/// Handlers return `Result<_, ApiError>` so failures cannot be ignored; the
/// `IntoResponse` impl owns the status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Zero-byte upload. Client error, checked before any pipeline work.
    #[error("received empty file")]
    EmptyFile,
    /// Malformed multipart form or no file field present
    #[error("invalid upload: {0}")]
    BadUpload(String),
    /// Registry is unloaded. Should not occur after successful startup but
    /// is checked defensively on every request.
    #[error("model not available, try again later")]
    ModelNotLoaded,
    /// Undecodable image bytes. Client-caused.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    /// Forward-pass failure. Server-caused, never retried.
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyFile | ApiError::BadUpload(_) | ApiError::Preprocess(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Prediction failed: {self}");
        } else {
            warn!("Request rejected ({}): {self}", status.as_u16());
        }

        let body = Json(json!({
            "success": false,
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}
