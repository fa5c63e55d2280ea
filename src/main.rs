//! Paper Analyst - Upload Form Server
//!
//! Accepts past exam papers over HTTP and returns a strategy report.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paper_analyst::api::{self, AppState};
use paper_analyst::{AnalystConfig, GeminiClient, GenerativeService, PipelineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "paper_analyst=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AnalystConfig::from_env();

    info!("Starting Paper Analyst v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", config.model);

    let service: Option<Arc<dyn GenerativeService>> = match &config.api_key {
        Some(key) => Some(Arc::new(
            GeminiClient::new(&config, key.clone()).context("failed to build model client")?,
        )),
        None => {
            warn!("GOOGLE_API_KEY not set; requests must carry their own api_key");
            None
        }
    };

    let state = Arc::new(AppState {
        config,
        service,
        pipeline_config: PipelineConfig::interactive(),
    });

    let app = api::router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3021);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
