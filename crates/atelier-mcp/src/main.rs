//! Atelier MCP Server
//!
//! Model Context Protocol server for image generation and editing.
//! Run with: IMAGE_API_KEY=xxx atelier-mcp

use anyhow::Context;
use atelier_core::Config;
use atelier_mcp::{ImageApiClient, ImageToolServer, ImageToolService};
use atelier_storage::cleanup_old_files;
use rmcp::service::ServiceExt;
use rmcp::transport::io::stdio;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().context(
        "Failed to load configuration. Set IMAGE_API_KEY (or OPENAI_API_KEY) environment variable",
    )?;

    tracing::info!(
        api_base_url = %config.api_base_url,
        model = %config.image_model,
        output_dir = %config.default_output_dir.display(),
        file_output_enabled = config.file_output_enabled,
        "Starting atelier-mcp"
    );

    if config.file_output_enabled && config.file_retention_days > 0 {
        let base = config.default_output_dir.clone();
        let retention_days = config.file_retention_days;
        tokio::spawn(async move {
            match cleanup_old_files(&base, retention_days).await {
                Ok(removed) => tracing::debug!(removed_count = removed, "Startup cleanup finished"),
                Err(e) => tracing::warn!(error = %e, "Startup cleanup failed"),
            }
        });
    }

    let api_client =
        ImageApiClient::from_config(&config).context("Failed to create image API client")?;
    let service = ImageToolService::new(&config, Arc::new(api_client))
        .context("Failed to initialize image tools")?;

    let server = ImageToolServer::new(service);
    let running = server.serve(stdio()).await.context("MCP transport failed")?;
    running.waiting().await.context("MCP server error")?;

    Ok(())
}
