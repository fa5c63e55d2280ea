//! Boundary to the hosted generative model service.

mod gemini;
#[cfg(test)]
pub(crate) mod testing;
mod wire;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::invoker::SafetySettings;
use crate::types::{RemoteAsset, RequestPayload};

pub use gemini::GeminiClient;

/// Diagnostic feedback the service attaches to a prompt it refused or
/// partially answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

/// Probability the service assigned to one harm category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

/// Raw outcome of a generate call.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Concatenated text of the first candidate, if any was returned
    pub text: Option<String>,

    /// Why the candidate stopped (e.g. `STOP`, `SAFETY`)
    pub finish_reason: Option<String>,

    pub feedback: Option<PromptFeedback>,
}

/// A model offered by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model can answer `generateContent` requests.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// Operations the pipeline needs from the model service.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Upload a staged file; the asset may still be pending.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteAsset, RemoteError>;

    /// Re-query an uploaded asset.
    async fn get_file(&self, reference_id: &str) -> Result<RemoteAsset, RemoteError>;

    /// Run one generation over the assembled payload.
    async fn generate(
        &self,
        payload: &RequestPayload,
        safety: &SafetySettings,
    ) -> Result<Generation, RemoteError>;

    /// List the models visible to the credential.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, RemoteError>;
}
