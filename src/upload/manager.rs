//! Uploads binary assets and waits until the service can use them.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::poller::{PollBudget, PollPolicy, Sleeper, TokioSleeper};
use crate::error::{FileError, UploadError};
use crate::processing::normalizer::caption;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::remote::GenerativeService;
use crate::types::{AssetKind, InputFile, NormalizedFragment, ProcessingState, RemoteAsset};

/// Uploads files to the remote service and polls them until ready.
pub struct RemoteUploadManager {
    service: Arc<dyn GenerativeService>,
    policy: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RemoteUploadManager {
    /// Create a manager that waits on the real clock.
    pub fn new(service: Arc<dyn GenerativeService>, policy: PollPolicy) -> Self {
        Self {
            service,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Substitute the clock used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Upload a file and wrap the ready asset as a captioned fragment.
    pub async fn upload_fragment(
        &self,
        file: &InputFile,
        kind: AssetKind,
        progress: &ProgressSink,
    ) -> Result<NormalizedFragment, FileError> {
        let mime_type = upload_mime_type(file, kind);
        let asset = self
            .upload(file, mime_type, progress)
            .await
            .map_err(|source| FileError::Upload {
                name: file.name().to_string(),
                source,
            })?;

        Ok(NormalizedFragment::RemoteHandle {
            asset,
            caption: caption(kind, file.name()),
        })
    }

    /// Upload raw content and block until the remote state is `Ready`.
    ///
    /// The content is staged in a temporary file for the duration of the
    /// call; the file is removed on every return path.
    pub async fn upload(
        &self,
        file: &InputFile,
        mime_type: &str,
        progress: &ProgressSink,
    ) -> Result<RemoteAsset, UploadError> {
        let staged = stage(file)?;

        progress.emit(ProgressEvent::Uploading {
            name: file.name().to_string(),
        });
        let mut asset = self
            .service
            .upload_file(staged.path(), mime_type, file.name())
            .await?;

        let mut budget = PollBudget::default();
        loop {
            match asset.processing_state {
                ProcessingState::Ready => {
                    info!(
                        file = %file.name(),
                        reference_id = %asset.reference_id,
                        polls = budget.attempts,
                        "Upload ready"
                    );
                    return Ok(asset);
                }
                ProcessingState::Failed => {
                    warn!(file = %file.name(), reference_id = %asset.reference_id, "Remote processing failed");
                    return Err(UploadError::ProcessingFailed {
                        reference_id: asset.reference_id,
                    });
                }
                ProcessingState::Pending => {}
            }

            let Some(delay) = budget.next_delay(&self.policy) else {
                warn!(
                    file = %file.name(),
                    attempts = budget.attempts,
                    waited = ?budget.waited,
                    "Gave up waiting for remote processing"
                );
                return Err(UploadError::TimedOut {
                    reference_id: asset.reference_id,
                    attempts: budget.attempts,
                    waited: budget.waited,
                });
            };

            self.sleeper.sleep(delay).await;
            budget.record(delay);
            progress.emit(ProgressEvent::Polling {
                name: file.name().to_string(),
                attempt: budget.attempts,
            });
            debug!(file = %file.name(), attempt = budget.attempts, ?delay, "Polling upload state");

            asset = self.service.get_file(&asset.reference_id).await?;
        }
    }
}

/// Write the file's bytes to a temporary file that deletes itself on drop.
fn stage(file: &InputFile) -> Result<tempfile::NamedTempFile, UploadError> {
    let suffix = file
        .extension()
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut staged = tempfile::Builder::new()
        .prefix("paper-analyst-")
        .suffix(&suffix)
        .tempfile()?;
    staged.write_all(file.raw_bytes())?;
    staged.flush()?;

    Ok(staged)
}

/// MIME type sent with an upload.
///
/// A recognized declared image type wins over the file extension.
fn upload_mime_type(file: &InputFile, kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Pdf => "application/pdf",
        AssetKind::Image => {
            let declared = file
                .declared_type()
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();

            match declared.as_str() {
                "image/png" => "image/png",
                "image/jpeg" | "image/jpg" => "image/jpeg",
                _ => match file.extension().as_deref() {
                    Some("png") => "image/png",
                    _ => "image/jpeg",
                },
            }
        }
    }
}
