//! End-to-end ingestion and analysis of a set of papers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::assembler::{Assembly, BatchSummary, FileOutcome, RequestAssembler, SkipNotice};
use crate::error::{AnalysisError, FileError};
use crate::invoker::{AnalysisInvoker, SafetySettings};
use crate::processing::{ContentNormalizer, FileClassifier};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::remote::GenerativeService;
use crate::types::{
    AnalysisResult, AnalystConfig, AssetKind, FailurePolicy, FileKind, ImageStrategy, InputFile,
    NormalizedFragment, PipelineConfig,
};
use crate::upload::{RemoteUploadManager, Sleeper};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub result: AnalysisResult,
    pub summary: BatchSummary,
    pub generated_at: DateTime<Utc>,
}

/// Sequential pipeline: classify, normalize or upload, assemble, invoke.
pub struct AnalysisPipeline {
    classifier: FileClassifier,
    normalizer: ContentNormalizer,
    uploader: RemoteUploadManager,
    assembler: RequestAssembler,
    invoker: AnalysisInvoker,
    config: PipelineConfig,
    progress: ProgressSink,
}

impl AnalysisPipeline {
    /// Create a pipeline over the given service.
    pub fn new(
        service: Arc<dyn GenerativeService>,
        analyst: &AnalystConfig,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier: FileClassifier::new(),
            normalizer: ContentNormalizer::new(config.text_mode),
            uploader: RemoteUploadManager::new(Arc::clone(&service), analyst.poll.clone()),
            assembler: RequestAssembler::new(config.instruction.clone()),
            invoker: AnalysisInvoker::new(service),
            config,
            progress: ProgressSink::none(),
        }
    }

    /// Substitute the clock used while polling uploads.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.uploader = self.uploader.with_sleeper(sleeper);
        self
    }

    pub fn with_safety(mut self, safety: SafetySettings) -> Self {
        self.invoker = self.invoker.with_safety(safety);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Process all files and request the report.
    pub async fn run(&self, files: Vec<InputFile>) -> Result<PipelineReport, AnalysisError> {
        self.run_loaded(files.into_iter().map(Ok).collect()).await
    }

    /// Like [`AnalysisPipeline::run`], for inputs that may have failed to
    /// load. Load failures are handled like any other per-file failure and
    /// count toward the total.
    pub async fn run_loaded(
        &self,
        files: Vec<Result<InputFile, FileError>>,
    ) -> Result<PipelineReport, AnalysisError> {
        let span = info_span!("analysis", run_id = %Uuid::new_v4(), files = files.len());

        async move {
            let assembly = self.ingest(files).await?;
            let summary = assembly.summary;

            if self.config.require_content && !summary.has_content() {
                warn!(total = summary.total_files, "No file could be processed, not calling the model");
                return Err(AnalysisError::NoUsableContent {
                    total_files: summary.total_files,
                });
            }

            self.progress.emit(ProgressEvent::Sending {
                processed: summary.processed_files,
                total: summary.total_files,
            });
            let result = self.invoker.send(&assembly.payload).await?;

            info!(
                processed = summary.processed_files,
                total = summary.total_files,
                report_chars = result.report_text.len(),
                "Analysis complete"
            );

            Ok(PipelineReport {
                result,
                summary,
                generated_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Handle every file in order and assemble the payload.
    ///
    /// Under [`FailurePolicy::Abort`] the first load, decode or upload failure ends
    /// the run; unrecognized and empty files are always skipped.
    pub async fn ingest(
        &self,
        files: Vec<Result<InputFile, FileError>>,
    ) -> Result<Assembly, AnalysisError> {
        if files.is_empty() {
            return Err(AnalysisError::NoFiles);
        }

        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);

        info!(total, "Processing files");

        for (index, entry) in files.into_iter().enumerate() {
            let (name, kind) = match &entry {
                Ok(file) => (file.name().to_string(), self.classifier.classify(file)),
                Err(e) => (e.file_name().to_string(), self.classifier.classify_name(e.file_name())),
            };
            self.progress.emit(ProgressEvent::Started {
                index,
                total,
                name: name.clone(),
                kind,
            });

            let result = match entry {
                Ok(file) => self.process_file(&file, kind).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(fragment) => {
                    self.progress.emit(ProgressEvent::Contributed { name });
                    outcomes.push(FileOutcome::Contributed(fragment));
                }
                Err(e) => {
                    if !e.always_skipped() && self.config.failure_policy == FailurePolicy::Abort {
                        warn!(file = %name, error = %e, "Aborting run");
                        return Err(AnalysisError::FileAborted(e));
                    }

                    warn!(file = %name, error = %e, "Skipping file");
                    let notice = SkipNotice::from(&e);
                    self.progress.emit(ProgressEvent::Skipped {
                        name: notice.file_name.clone(),
                        reason: notice.reason.clone(),
                    });
                    outcomes.push(FileOutcome::Skipped(notice));
                }
            }
        }

        let assembly = self.assembler.assemble(outcomes);
        info!(
            processed = assembly.summary.processed_files,
            skipped = assembly.summary.skipped.len(),
            "Files processed"
        );
        Ok(assembly)
    }

    async fn process_file(&self, file: &InputFile, kind: FileKind) -> Result<NormalizedFragment, FileError> {
        match kind {
            FileKind::Image => match self.config.image_strategy {
                ImageStrategy::Inline => self.normalizer.normalize_image(file),
                ImageStrategy::Upload => {
                    self.uploader
                        .upload_fragment(file, AssetKind::Image, &self.progress)
                        .await
                }
            },
            FileKind::Pdf => {
                self.uploader
                    .upload_fragment(file, AssetKind::Pdf, &self.progress)
                    .await
            }
            FileKind::Html => self.normalizer.normalize_html(file),
            FileKind::Unrecognized => Err(FileError::Unrecognized {
                name: file.name().to_string(),
                declared_type: file.declared_type().to_string(),
            }),
        }
    }
}
