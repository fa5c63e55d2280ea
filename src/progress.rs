//! Per-file progress reporting for console front ends.

use tokio::sync::mpsc::UnboundedSender;

use crate::types::FileKind;

/// One step of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
        kind: FileKind,
    },
    Uploading {
        name: String,
    },
    Polling {
        name: String,
        attempt: u32,
    },
    Contributed {
        name: String,
    },
    Skipped {
        name: String,
        reason: String,
    },
    Sending {
        processed: usize,
        total: usize,
    },
}

/// Optional receiver of progress events. Sends never block or fail.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sink that drops everything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}
