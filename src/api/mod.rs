//! HTTP surface for the upload form.

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::{AnalyzeRequest, AnalyzeResponse, ApiError, AppState, UploadedFile};

/// Uploads are base64 in JSON, so allow generous bodies.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/analyze", post(handlers::analyze))
        .route("/models", get(handlers::list_models))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::remote::testing::FakeService;
    use crate::remote::GenerativeService;
    use crate::types::{AnalystConfig, PipelineConfig};

    fn app(configured: bool) -> Router {
        let service = configured.then(|| Arc::new(FakeService::new()) as Arc<dyn GenerativeService>);
        router(Arc::new(AppState {
            config: AnalystConfig::default(),
            service,
            pipeline_config: PipelineConfig::interactive(),
        }))
    }

    #[tokio::test]
    async fn test_health_reports_key_status() {
        let response = app(false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["api_key_configured"], false);
    }

    #[tokio::test]
    async fn test_analyze_without_files_returns_json_error() {
        let request = Request::post("/analyze")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"files": []}"#))
            .unwrap();

        let response = app(true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Please upload at least one file first!");
        assert!(json.get("feedback").is_none());
    }
}
