//! Skin-Lesion Classification API Server
//!
//! REST API serving single-image predictions for the inspection dashboard.

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
mod routes;

pub use config::Settings;
pub use error::ApiError;

use model_registry::ModelRegistry;

/// Application state shared across handlers.
///
/// The registry is populated once before the server binds and never mutated
/// afterward, so handlers share it without locks.
pub struct AppState {
    registry: Option<Arc<ModelRegistry>>,
    version: String,
}

impl AppState {
    /// State with a loaded registry, the normal serving configuration
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry: Some(Arc::new(registry)),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// State without a model. Every predict-path request is rejected with a
    /// service-unavailable response.
    pub fn unloaded() -> Self {
        Self {
            registry: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn registry(&self) -> Option<&ModelRegistry> {
        self.registry.as_deref()
    }
}

/// Root response, mirrored by the dashboard's landing check
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub model: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub device: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(routes::predict::predict))
        .route("/classes", get(routes::classes::get_classes))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = if state.registry().is_some() {
        "loaded"
    } else {
        "not loaded"
    };

    Json(RootResponse {
        message: "Skin lesion classification API".to_string(),
        status: "running".to_string(),
        version: state.version.clone(),
        model: model.to_string(),
    })
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.registry().is_some();
    let device = state
        .registry()
        .map(ModelRegistry::device)
        .unwrap_or("cpu")
        .to_string();

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded,
        device,
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server until shutdown
pub async fn run_server(settings: Settings, registry: ModelRegistry) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(registry));
    let app = create_router(state, settings.upload.max_bytes);

    let addr = settings.server.addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const MAX_UPLOAD: usize = 1024 * 1024;

    fn unloaded_router() -> Router {
        create_router(Arc::new(AppState::unloaded()), MAX_UPLOAD)
    }

    fn multipart_request(file_content: &[u8]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"lesion.png\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(file_content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_unloaded_model() {
        let response = unloaded_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["model_loaded"], false);
        assert_eq!(json["device"], "cpu");
    }

    #[tokio::test]
    async fn test_root_reports_service_info() {
        let response = unloaded_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "running");
        assert_eq!(json["model"], "not loaded");
    }

    #[tokio::test]
    async fn test_empty_file_rejected_before_registry_check() {
        let response = unloaded_router()
            .oneshot(multipart_request(b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_predict_without_model_returns_503() {
        let response = unloaded_router()
            .oneshot(multipart_request(b"fake image bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_predict_without_file_field_rejected() {
        let boundary = "test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = unloaded_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_classes_without_model_returns_503() {
        let response = unloaded_router()
            .oneshot(Request::get("/classes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
