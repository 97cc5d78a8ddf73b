//! The runfeed provider.
//!
//! Watches a pipeline backend for completed runs and delivers their completion events to the
//! operator's run completion feed.

mod app;
mod config;
mod error;
mod flow;
mod grpc;
mod providers;
mod sink;
mod sources;
mod stream;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;

use crate::app::App;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing/logging system.
    tracing_subscriber::registry()
        // Filter spans based on the RUST_LOG env var.
        .with(tracing_subscriber::EnvFilter::from_default_env())
        // Send a copy of all spans to stdout in compact form.
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true).with_ansi(true))
        // Install this registry as the global tracing registry.
        .try_init()
        .context("error initializing logging/tracing system")?;

    let cfg = Arc::new(Config::new()?);
    tracing::info!(
        provider_name = %cfg.provider_name,
        provider_type = %cfg.provider_type,
        operator_webhook = %cfg.operator_webhook,
        namespace = %cfg.namespace,
        "starting runfeed provider",
    );
    if let Err(err) = App::new(cfg).await?.spawn().await.context("error joining app handle").and_then(|res| res) {
        tracing::error!(error = ?err);
    }

    // Ensure any pending output is flushed.
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    Ok(())
}
