//! Paper Analyst Library
//!
//! Prepares past exam papers (photos, PDFs, saved HTML pages) for a hosted
//! generative model and asks it for recurring topics and likely questions.
//! Files are classified, normalized or uploaded one at a time, assembled in
//! input order, and sent as a single request.

pub mod api;
pub mod assembler;
pub mod error;
pub mod invoker;
pub mod pipeline;
pub mod processing;
pub mod progress;
pub mod prompts;
pub mod remote;
pub mod types;
pub mod upload;

pub use assembler::{Assembly, BatchSummary, FileOutcome, RequestAssembler, SkipNotice};
pub use error::{AnalysisError, FileError, RemoteError, UploadError, QUOTA_GUIDANCE};
pub use invoker::{AnalysisInvoker, BlockThreshold, HarmCategory, SafetySettings};
pub use pipeline::{AnalysisPipeline, PipelineReport};
pub use processing::{ContentNormalizer, FileClassifier};
pub use progress::{ProgressEvent, ProgressSink};
pub use remote::{GeminiClient, GenerativeService, ModelInfo, PromptFeedback};
pub use types::{
    AnalysisResult, AnalystConfig, ApiKey, AssetKind, FileKind, InputFile, NormalizedFragment,
    PipelineConfig, RemoteAsset, RequestPayload,
};
pub use upload::{PollPolicy, RemoteUploadManager};

/// Images larger than this on either side are downscaled to fit
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

/// Extracted HTML text of this many characters or fewer counts as empty
pub const MIN_TEXT_CHARS: usize = 50;

/// Extracted HTML text is capped at this many characters
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

/// Generative Language API endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
