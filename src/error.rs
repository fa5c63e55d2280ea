//! Error taxonomy for ingestion, upload and analysis.

use std::time::Duration;

use thiserror::Error;

use crate::remote::PromptFeedback;

/// Message shown when the model service reports quota exhaustion.
pub const QUOTA_GUIDANCE: &str = "Too much data! Try uploading fewer files.";

/// Failure talking to the remote model service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("resource exhausted: {message}")]
    QuotaExceeded { message: String },

    #[error("model service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request to model service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from model service: {0}")]
    InvalidResponse(String),

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("could not read staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure uploading an asset or waiting for it to become ready.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("remote processing failed for {reference_id}")]
    ProcessingFailed { reference_id: String },

    #[error("{reference_id} still processing after {attempts} polls ({waited:?} waited)")]
    TimedOut {
        reference_id: String,
        attempts: u32,
        waited: Duration,
    },

    #[error("could not stage upload: {0}")]
    Staging(#[from] std::io::Error),
}

/// A single file could not contribute to the request.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{name}: unsupported file type '{declared_type}'")]
    Unrecognized { name: String, declared_type: String },

    #[error("{name} seems empty ({chars} characters of text, it might be images-only)")]
    EmptyContent { name: String, chars: usize },

    #[error("{name}: could not decode image: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{name}: upload failed: {source}")]
    Upload {
        name: String,
        #[source]
        source: UploadError,
    },

    #[error("{name}: could not read file: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    /// Name of the file the error belongs to.
    pub fn file_name(&self) -> &str {
        match self {
            FileError::Unrecognized { name, .. }
            | FileError::EmptyContent { name, .. }
            | FileError::Decode { name, .. }
            | FileError::Upload { name, .. }
            | FileError::Unreadable { name, .. } => name,
        }
    }

    /// Errors that never abort a run, whatever the failure policy.
    pub fn always_skipped(&self) -> bool {
        matches!(
            self,
            FileError::Unrecognized { .. } | FileError::EmptyContent { .. }
        )
    }
}

/// Terminal failure of an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{}", QUOTA_GUIDANCE)]
    QuotaExceeded { message: String },

    #[error("could not process any of the {total_files} files")]
    NoUsableContent { total_files: usize },

    #[error("analysis failed: {message}")]
    Generation {
        message: String,
        feedback: Option<PromptFeedback>,
    },

    #[error(transparent)]
    FileAborted(#[from] FileError),

    #[error("no API key configured")]
    MissingApiKey,

    #[error("no files provided")]
    NoFiles,
}
