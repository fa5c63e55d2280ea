//! Core types for the analysis pipeline.

mod config;
mod fragment;
mod input;

pub use config::{
    AnalystConfig, ApiKey, FailurePolicy, ImageStrategy, PipelineConfig, TextMode,
};
pub use fragment::{AnalysisResult, NormalizedFragment, ProcessingState, RemoteAsset, RequestPayload};
pub use input::{AssetKind, FileKind, InputFile};
