//! Classes Route

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

/// Response for the classes endpoint
#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
}

/// List every class the loaded checkpoint knows, in encoder order
pub async fn get_classes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClassesResponse>, ApiError> {
    let registry = state.registry().ok_or(ApiError::ModelNotLoaded)?;

    Ok(Json(ClassesResponse {
        classes: registry.labels().classes().to_vec(),
    }))
}
