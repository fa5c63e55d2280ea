//! Fragment, remote asset and payload types.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Remote-side processing state of an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    /// Still being processed; must be polled again
    Pending,
    /// Usable in a generate request
    Ready,
    /// Processing failed remotely
    Failed,
}

/// An uploaded asset as reported by the remote service.
///
/// Lives for a single pipeline run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAsset {
    /// Opaque reference (e.g. `files/abc123`)
    pub reference_id: String,

    /// URI used to reference the asset in a request
    pub uri: String,

    /// MIME type recorded by the service
    pub mime_type: String,

    /// Current processing state
    pub processing_state: ProcessingState,
}

/// One unit of content contributed to an outgoing request.
#[derive(Debug, Clone)]
pub enum NormalizedFragment {
    /// Decoded (and possibly downscaled) image, embedded inline
    Image {
        image: DynamicImage,
        mime_type: String,
        caption: String,
    },
    /// Extracted or raw text wrapped in a source delimiter
    TextBlock { text: String, source_name: String },
    /// Reference to an asset uploaded to the remote service
    RemoteHandle { asset: RemoteAsset, caption: String },
}

impl NormalizedFragment {
    /// Caption or source label attached to this fragment.
    pub fn label(&self) -> &str {
        match self {
            NormalizedFragment::Image { caption, .. } => caption,
            NormalizedFragment::TextBlock { source_name, .. } => source_name,
            NormalizedFragment::RemoteHandle { caption, .. } => caption,
        }
    }
}

/// Ordered request content: fragments in input order plus one trailing
/// instruction.
///
/// Built once per run by the assembler and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    fragments: Vec<NormalizedFragment>,
    instruction: String,
}

impl RequestPayload {
    pub(crate) fn new(fragments: Vec<NormalizedFragment>, instruction: String) -> Self {
        Self {
            fragments,
            instruction,
        }
    }

    pub fn fragments(&self) -> &[NormalizedFragment] {
        &self.fragments
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Number of elements sent, counting the instruction.
    pub fn len(&self) -> usize {
        self.fragments.len() + 1
    }

    /// Always false: the instruction is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether any file contributed content.
    pub fn has_content(&self) -> bool {
        !self.fragments.is_empty()
    }
}

/// The generated report for a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub report_text: String,
}
