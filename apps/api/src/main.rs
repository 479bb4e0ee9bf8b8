mod config;
mod errors;
mod export;
mod form;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::{default_pdf_layout, ExportSettings, PdfOptions};
use crate::llm_client::OpenAiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing API key)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the completion client once; every request shares it
    let llm = OpenAiClient::new(config.openai_api_key.clone(), &config.openai_base_url)
        .context("Failed to build HTTP client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Exported files are left in place for the OS to reclaim
    std::fs::create_dir_all(&config.export_dir).with_context(|| {
        format!("Cannot create export directory {}", config.export_dir.display())
    })?;
    let export = ExportSettings {
        dir: config.export_dir.clone(),
        layout: default_pdf_layout(),
        pdf: PdfOptions {
            escape_angle_brackets: config.pdf_escape_angle_brackets,
        },
    };
    info!(
        "Exporting to {} (escape angle brackets in PDF: {})",
        export.dir.display(),
        export.pdf.escape_angle_brackets
    );

    let state = AppState {
        llm: Arc::new(llm),
        export,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("HOST and PORT must form a valid socket address")?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
