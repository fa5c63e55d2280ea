//! HTTP client for the Generative Language API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info};

use super::wire::{
    build_request, error_from_status, FileResource, GenerateContentResponse, ListModelsResponse,
    UploadMetadata, UploadMetadataFile, UploadResponse,
};
use super::{GenerativeService, Generation, ModelInfo};
use crate::error::RemoteError;
use crate::invoker::SafetySettings;
use crate::types::{AnalystConfig, ApiKey, RemoteAsset, RequestPayload};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for uploads and generation against the hosted model.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
}

impl GeminiClient {
    /// Create a client from the service configuration.
    pub fn new(config: &AnalystConfig, api_key: ApiKey) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: normalize_model_name(&config.model),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn checked(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status.as_u16(), &body))
    }
}

/// Accept both `gemini-2.5-flash` and `models/gemini-2.5-flash`.
fn normalize_model_name(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteAsset, RemoteError> {
        let bytes = tokio::fs::read(path).await?;
        let url = format!("{}/upload/v1beta/files", self.base_url);

        debug!(display_name, mime_type, size_bytes = bytes.len(), "Starting resumable upload");

        let start = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadMetadata {
                file: UploadMetadataFile { display_name },
            })
            .send()
            .await?;
        let start = Self::checked(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::InvalidResponse("missing x-goog-upload-url header".to_string()))?;

        let finish = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::checked(finish).await?.json().await?;

        info!(reference_id = %uploaded.file.name, display_name, "Uploaded file");
        Ok(uploaded.file.into())
    }

    async fn get_file(&self, reference_id: &str) -> Result<RemoteAsset, RemoteError> {
        let url = format!("{}/v1beta/{}", self.base_url, reference_id);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await?;
        let file: FileResource = Self::checked(response).await?.json().await?;

        Ok(file.into())
    }

    async fn generate(
        &self,
        payload: &RequestPayload,
        safety: &SafetySettings,
    ) -> Result<Generation, RemoteError> {
        let request = build_request(payload, safety)?;
        let url = format!("{}/v1beta/{}:generateContent", self.base_url, self.model);

        info!(model = %self.model, parts = payload.len(), "Sending generate request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&request)
            .send()
            .await?;
        let response: GenerateContentResponse = Self::checked(response).await?.json().await?;

        Ok(response.into())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, RemoteError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, self.api_key.expose())
                .query(&[("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListModelsResponse = Self::checked(request.send().await?).await?.json().await?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}
