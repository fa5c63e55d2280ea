//! Configuration types for the analysis pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::prompts;
use crate::upload::PollPolicy;
use crate::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank values.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Global service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AnalystConfig {
    /// Credential for the model service, if one is configured
    pub api_key: Option<ApiKey>,

    /// Model used for generation
    pub model: String,

    /// Base URL of the Generative Language API
    pub api_base_url: String,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// Polling behaviour while uploads are processed
    pub poll: PollPolicy,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(300),
            poll: PollPolicy::default(),
        }
    }
}

impl AnalystConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll_defaults = PollPolicy::default();

        let poll = PollPolicy {
            initial_interval: env_parse("ANALYST_POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(poll_defaults.initial_interval),
            max_attempts: env_parse("ANALYST_POLL_MAX_ATTEMPTS")
                .map(Some)
                .unwrap_or(poll_defaults.max_attempts),
            timeout: env_parse("ANALYST_POLL_TIMEOUT_SECS")
                .map(|secs| Some(Duration::from_secs(secs)))
                .unwrap_or(poll_defaults.timeout),
            ..poll_defaults
        };

        Self {
            api_key: std::env::var("GOOGLE_API_KEY").ok().and_then(ApiKey::new),
            model: std::env::var("ANALYST_MODEL").unwrap_or(defaults.model),
            api_base_url: std::env::var("ANALYST_API_BASE").unwrap_or(defaults.api_base_url),
            request_timeout: env_parse("ANALYST_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            poll,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// What to do when a file fails to load, decode or upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record a skip notice and continue with the next file
    SkipFile,
    /// Stop the run and surface the file error
    Abort,
}

/// How images reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStrategy {
    /// Decode, downscale and embed in the request body
    Inline,
    /// Upload through the remote file service like PDFs
    Upload,
}

/// How HTML files are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Parse, drop boilerplate elements, enforce length thresholds
    ExtractHtml,
    /// Lenient decode of the raw bytes, markup included
    Raw,
}

/// Per-run behaviour of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub failure_policy: FailurePolicy,
    pub image_strategy: ImageStrategy,
    pub text_mode: TextMode,

    /// Skip the generate call when no file produced content
    pub require_content: bool,

    /// Trailing instruction sent after all fragments
    pub instruction: String,
}

impl PipelineConfig {
    /// Upload-form behaviour: inline images, cleaned HTML, abort on failure,
    /// always call the model.
    pub fn interactive() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            image_strategy: ImageStrategy::Inline,
            text_mode: TextMode::ExtractHtml,
            require_content: false,
            instruction: prompts::PATTERN_REPORT.to_string(),
        }
    }

    /// Directory-scan behaviour: everything binary uploaded, raw HTML text,
    /// per-file isolation, model called only when something succeeded.
    pub fn batch() -> Self {
        Self {
            failure_policy: FailurePolicy::SkipFile,
            image_strategy: ImageStrategy::Upload,
            text_mode: TextMode::Raw,
            require_content: true,
            instruction: prompts::PARTIAL_BATCH_REPORT.to_string(),
        }
    }

    /// One uploaded paper analysed for question extraction.
    pub fn single_paper() -> Self {
        Self {
            instruction: prompts::SINGLE_PAPER.to_string(),
            ..Self::batch()
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
