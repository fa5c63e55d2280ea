//! Console scanner: analyzes every exam paper in a folder.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use paper_analyst::{
    AnalysisError, AnalysisPipeline, AnalystConfig, FileError, GeminiClient, GenerativeService,
    InputFile, PipelineConfig, ProgressEvent, ProgressSink,
};
use paper_analyst::types::FailurePolicy;

/// Patterns picked up when no paths are given.
const SCAN_PATTERNS: &[&str] = &["*.jpg", "*.jpeg", "*.png", "*.pdf", "*.html", "*.htm"];

#[derive(Parser)]
#[command(name = "scan", about = "Find patterns in past exam papers")]
struct Cli {
    /// Files to analyze (default: every supported file in --dir)
    paths: Vec<PathBuf>,

    /// Folder to scan when no paths are given
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Analyze one paper and extract its questions
    #[arg(long, conflicts_with = "paths")]
    single: Option<PathBuf>,

    /// List models that can generate content, then exit
    #[arg(long)]
    list_models: bool,

    /// Stop at the first file that fails instead of skipping it
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paper_analyst=warn")),
        )
        .init();

    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AnalystConfig::from_env();
    let Some(api_key) = config.api_key.clone() else {
        bail!("GOOGLE_API_KEY is not set (export it or put it in .env)");
    };
    let service: Arc<dyn GenerativeService> =
        Arc::new(GeminiClient::new(&config, api_key).context("failed to build model client")?);

    if cli.list_models {
        return list_models(service.as_ref()).await;
    }

    let (paths, pipeline_config) = match &cli.single {
        Some(path) => (vec![path.clone()], PipelineConfig::single_paper()),
        None if cli.paths.is_empty() => (discover(&cli.dir)?, PipelineConfig::batch()),
        None => (cli.paths.clone(), PipelineConfig::batch()),
    };
    let pipeline_config = if cli.strict {
        pipeline_config.with_failure_policy(FailurePolicy::Abort)
    } else {
        pipeline_config
    };

    if paths.is_empty() {
        bail!("No exam papers found in {}", cli.dir.display());
    }

    println!("Found {} files. Processing one by one...", paths.len());
    let files = load_files(&paths).await;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_progress(rx));
    let pipeline = AnalysisPipeline::new(service, &config, pipeline_config)
        .with_progress(ProgressSink::new(tx));

    let outcome = tokio::select! {
        result = pipeline.run_loaded(files) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    drop(pipeline);
    printer.await.ok();

    match outcome {
        None => bail!("Cancelled"),
        Some(Ok(report)) => {
            println!();
            println!("{}", "=".repeat(40));
            println!("THE STRATEGY REPORT ({} of {} files)", report.summary.processed_files, report.summary.total_files);
            println!("{}", "=".repeat(40));
            println!("{}", report.result.report_text);
            Ok(())
        }
        Some(Err(AnalysisError::NoUsableContent { .. })) => {
            bail!("Could not process any files successfully. Check your internet connection.")
        }
        Some(Err(AnalysisError::Generation { message, feedback })) => {
            if let Some(feedback) = feedback {
                eprintln!("Debug info: {:?}", feedback);
            }
            bail!("Analysis failed: {}", message)
        }
        Some(Err(e)) => bail!("Analysis failed: {}", e),
    }
}

/// Supported files in `dir`, grouped by pattern.
fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for pattern in SCAN_PATTERNS {
        let full = dir.join(pattern);
        let full = full.to_str().context("scan directory is not valid UTF-8")?;
        for entry in glob::glob(full)? {
            match entry {
                Ok(path) if path.is_file() => found.push(path),
                Ok(_) => {}
                Err(e) => eprintln!("   Cannot read {}: {}", e.path().display(), e.error()),
            }
        }
    }
    Ok(found)
}

/// Read every path. Unreadable files stay in the list as failures so they
/// count toward the total.
async fn load_files(paths: &[PathBuf]) -> Vec<Result<InputFile, FileError>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(InputFile::load(path).await);
    }
    files
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Started { index, total, name, kind } => {
                println!("\n   [{}/{}] Processing: {} ({})", index + 1, total, name, kind);
            }
            ProgressEvent::Uploading { .. } => {
                println!("      Uploading to the model service... (please wait)");
            }
            ProgressEvent::Polling { attempt, .. } => {
                println!("      still processing (check {})", attempt);
            }
            ProgressEvent::Contributed { .. } => println!("      Done."),
            ProgressEvent::Skipped { reason, .. } => {
                println!("      FAILED: {}", reason);
                println!("      Skipping this file and moving to the next...");
            }
            ProgressEvent::Sending { processed, total } => {
                println!("\nSending {} of {} files to the analyst...", processed, total);
            }
        }
    }
}

async fn list_models(service: &dyn GenerativeService) -> Result<()> {
    println!("Checking available models...");
    let models = service.list_models().await.context("failed to list models")?;
    for model in models.iter().filter(|m| m.supports_generate_content()) {
        println!("{}", model.name);
    }
    Ok(())
}
