//! Forge Builder
//!
//! A worker that turns payload build requests into finished, uploaded agent
//! binaries.
//!
//! Architecture:
//! - Configuration: Load settings from environment
//! - Repositories: Configuration store and outbound event bus
//! - Services: Business logic (command execution, publishing, error reporting, builds)
//! - Scheduler: Request consumption and build concurrency
//!
//! Requests arrive as JSON lines on stdin. Events (`Payload` announcements
//! and `NewErrorMessage` reports) are written as JSON lines to stdout, and
//! logs go to stderr.

mod config;
mod error;
mod repository;
mod scheduler;
mod service;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use forge_client::ArtifactClient;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{CatalogStore, JsonLinesEventBus};
use crate::scheduler::RequestConsumer;
use crate::service::{ApiArtifactPublisher, BuildService, ShellCommandRunner};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries events
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge_builder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Forge Builder");

    let config = load_config()?;
    info!(
        "Loaded configuration: agents_path={}, api_url={}, max_parallel_builds={}",
        config.agents_path.display(),
        config.api_url,
        config.max_parallel_builds
    );

    let store = Arc::new(
        CatalogStore::load(&config.catalog_path)
            .await
            .context("Failed to load agent catalog")?,
    );
    let bus = Arc::new(JsonLinesEventBus::new(tokio::io::stdout()));
    let runner = Arc::new(ShellCommandRunner::new(
        config.shell.clone(),
        config.build_timeout,
    ));
    let publisher = Arc::new(ApiArtifactPublisher::new(
        ArtifactClient::new(config.api_url.clone()),
        config.build_output_dir(),
    ));

    let service = Arc::new(BuildService::new(&config, store, bus, runner, publisher));
    info!("Services initialized");

    let consumer = RequestConsumer::new(service, config.max_parallel_builds);
    if let Err(e) = consumer.run(BufReader::new(tokio::io::stdin())).await {
        error!("Consumer error: {:#}", e);
        return Err(e);
    }

    info!("Request stream closed, shutting down");
    Ok(())
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
