//! omnisuggest server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use omnisuggest_client::{HttpTransport, SearchSession};
use omnisuggest_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    tracing::info!(db_path = %config.db_path.display(), "Starting omnisuggest server on stdio transport");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache at {}", config.db_path.display()))?;
    let transport = HttpTransport::new(&config).context("building HTTP transport")?;
    let session = Arc::new(SearchSession::new(&config, Arc::new(transport), Arc::new(db))?);

    // expiry alarms do not survive restarts
    match session.cache().purge_expired(Utc::now().timestamp_millis()).await {
        Ok(removed) => tracing::info!(removed, "startup cache sweep finished"),
        Err(e) => tracing::warn!("startup cache sweep failed: {e}"),
    }

    let handler = handler::OmnisuggestServer::new(session);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
