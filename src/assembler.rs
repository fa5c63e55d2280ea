//! Collects per-file outcomes into one ordered request payload.

use serde::{Deserialize, Serialize};

use crate::error::FileError;
use crate::types::{NormalizedFragment, RequestPayload};

/// A file that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipNotice {
    pub file_name: String,
    pub reason: String,
}

impl From<&FileError> for SkipNotice {
    fn from(error: &FileError) -> Self {
        Self {
            file_name: error.file_name().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result of handling one input file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Contributed(NormalizedFragment),
    Skipped(SkipNotice),
}

/// Success counts and warnings for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub processed_files: usize,
    pub skipped: Vec<SkipNotice>,
}

impl BatchSummary {
    pub fn has_content(&self) -> bool {
        self.processed_files > 0
    }

    /// Warning lines for display.
    pub fn warnings(&self) -> Vec<String> {
        self.skipped.iter().map(|s| s.reason.clone()).collect()
    }
}

/// Payload plus the diagnostics describing how it was built.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub payload: RequestPayload,
    pub summary: BatchSummary,
}

/// Builds the request from outcomes in input order.
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    instruction: String,
}

impl RequestAssembler {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Concatenate contributed fragments in order and append the instruction.
    ///
    /// Skipped files leave no gap; they only show up in the summary. Never
    /// fails, even when nothing was contributed.
    pub fn assemble(&self, outcomes: Vec<FileOutcome>) -> Assembly {
        let total_files = outcomes.len();
        let mut fragments = Vec::with_capacity(total_files);
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                FileOutcome::Contributed(fragment) => fragments.push(fragment),
                FileOutcome::Skipped(notice) => skipped.push(notice),
            }
        }

        let summary = BatchSummary {
            total_files,
            processed_files: fragments.len(),
            skipped,
        };

        Assembly {
            payload: RequestPayload::new(fragments, self.instruction.clone()),
            summary,
        }
    }
}
