//! HTTP request handlers for the upload form.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::pipeline::AnalysisPipeline;
use crate::remote::{GeminiClient, GenerativeService, ModelInfo, PromptFeedback};
use crate::types::{AnalystConfig, ApiKey, InputFile, PipelineConfig};

/// Request header carrying a caller-supplied API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Application state shared across handlers.
pub struct AppState {
    pub config: AnalystConfig,
    /// Service built from the configured key, if there is one
    pub service: Option<Arc<dyn GenerativeService>>,
    pub pipeline_config: PipelineConfig,
}

impl AppState {
    /// Pick the service for a request: a key in the request wins over the
    /// configured one.
    fn service_for(&self, api_key: Option<&str>) -> Result<Arc<dyn GenerativeService>, ApiError> {
        if let Some(key) = api_key.and_then(ApiKey::new) {
            let client = GeminiClient::new(&self.config, key)
                .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
            return Ok(Arc::new(client));
        }
        self.service
            .clone()
            .ok_or_else(|| ApiError::from(AnalysisError::MissingApiKey))
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    api_key_configured: bool,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_key_configured: state.service.is_some(),
    })
}

/// One uploaded paper, base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    #[serde(default)]
    pub content_type: String,
    pub data: String,
}

/// Request to analyze a set of papers.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// The strategy report plus per-file diagnostics.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub report: String,
    pub processed_files: usize,
    pub total_files: usize,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Analyze uploaded papers.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if request.files.is_empty() {
        return Err(AnalysisError::NoFiles.into());
    }
    let service = state.service_for(request.api_key.as_deref())?;

    let files = request
        .files
        .into_iter()
        .map(|f| {
            let bytes = STANDARD.decode(f.data.as_bytes()).map_err(|e| {
                ApiError::new(StatusCode::BAD_REQUEST, format!("{}: invalid base64 data: {}", f.name, e))
            })?;
            Ok(InputFile::new(f.name, f.content_type, bytes))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    info!(files = files.len(), "Received analysis request");

    let pipeline = AnalysisPipeline::new(service, &state.config, state.pipeline_config.clone());
    let report = pipeline.run(files).await?;

    Ok(Json(AnalyzeResponse {
        report: report.result.report_text,
        processed_files: report.summary.processed_files,
        total_files: report.summary.total_files,
        warnings: report.summary.warnings(),
        generated_at: report.generated_at,
    }))
}

/// Models usable for analysis.
///
/// A key in the `x-goog-api-key` header wins over the configured one.
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let service = state.service_for(api_key)?;
    let models = service
        .list_models()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(
        models
            .into_iter()
            .filter(ModelInfo::supports_generate_content)
            .collect(),
    ))
}

/// Error body returned to the form.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<PromptFeedback>,
}

/// Handler error with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                feedback: None,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.body.error
    }
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        let status = match &error {
            AnalysisError::NoFiles => StatusCode::BAD_REQUEST,
            AnalysisError::MissingApiKey => StatusCode::UNAUTHORIZED,
            AnalysisError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::NoUsableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::Generation { .. } | AnalysisError::FileAborted(_) => StatusCode::BAD_GATEWAY,
        };
        warn!(status = %status, error = %error, "Analysis request failed");

        let message = match &error {
            AnalysisError::NoFiles => "Please upload at least one file first!".to_string(),
            AnalysisError::MissingApiKey => "Please provide an API key first!".to_string(),
            other => other.to_string(),
        };
        let feedback = match error {
            AnalysisError::Generation { feedback, .. } => feedback,
            _ => None,
        };

        Self {
            status,
            body: ErrorResponse {
                error: message,
                feedback,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
