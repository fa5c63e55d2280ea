//! Sends the assembled payload to the model and maps the outcome.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AnalysisError, RemoteError};
use crate::remote::GenerativeService;
use crate::types::{AnalysisResult, RequestPayload};

/// Content-filter categories the service applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn api_name(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

/// How aggressively a category is filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockThreshold {
    BlockNone,
    BlockSome,
    BlockMost,
}

impl BlockThreshold {
    pub fn api_name(&self) -> &'static str {
        match self {
            BlockThreshold::BlockNone => "BLOCK_NONE",
            BlockThreshold::BlockSome => "BLOCK_MEDIUM_AND_ABOVE",
            BlockThreshold::BlockMost => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

/// Per-category filter thresholds sent with every generate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySettings {
    thresholds: BTreeMap<HarmCategory, BlockThreshold>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self::permissive()
    }
}

impl SafetySettings {
    /// Every category set to `BlockNone`.
    ///
    /// Exam questions about chemistry, history or medicine regularly trip
    /// the default filters.
    pub fn permissive() -> Self {
        Self {
            thresholds: HarmCategory::ALL
                .iter()
                .map(|c| (*c, BlockThreshold::BlockNone))
                .collect(),
        }
    }

    pub fn with(mut self, category: HarmCategory, threshold: BlockThreshold) -> Self {
        self.thresholds.insert(category, threshold);
        self
    }

    pub fn threshold(&self, category: HarmCategory) -> Option<BlockThreshold> {
        self.thresholds.get(&category).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (HarmCategory, BlockThreshold)> + '_ {
        self.thresholds.iter().map(|(c, t)| (*c, *t))
    }
}

/// Issues the single generate call of a run.
pub struct AnalysisInvoker {
    service: Arc<dyn GenerativeService>,
    safety: SafetySettings,
}

impl AnalysisInvoker {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self {
            service,
            safety: SafetySettings::permissive(),
        }
    }

    pub fn with_safety(mut self, safety: SafetySettings) -> Self {
        self.safety = safety;
        self
    }

    /// Send the payload and map the result.
    ///
    /// Quota exhaustion is surfaced as [`AnalysisError::QuotaExceeded`] and
    /// never retried here.
    pub async fn send(&self, payload: &RequestPayload) -> Result<AnalysisResult, AnalysisError> {
        info!(fragments = payload.fragments().len(), "Requesting analysis");

        let generation = match self.service.generate(payload, &self.safety).await {
            Ok(generation) => generation,
            Err(RemoteError::QuotaExceeded { message }) => {
                warn!(%message, "Model service quota exhausted");
                return Err(AnalysisError::QuotaExceeded { message });
            }
            Err(e) => {
                error!(error = %e, "Analysis request failed");
                return Err(AnalysisError::Generation {
                    message: e.to_string(),
                    feedback: None,
                });
            }
        };

        match generation.text {
            Some(report_text) => Ok(AnalysisResult { report_text }),
            None => {
                let reason = generation
                    .feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .or(generation.finish_reason)
                    .unwrap_or_else(|| "no candidates".to_string());
                error!(%reason, "Model returned no text");
                Err(AnalysisError::Generation {
                    message: format!("model returned no text ({})", reason),
                    feedback: generation.feedback,
                })
            }
        }
    }
}
