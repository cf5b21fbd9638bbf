//! Yarnscope Daemon
//!
//! The polling-and-dispatch core of a Hadoop-cluster job-performance monitor.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Resolver: Determine the active ResourceManager (fixed, HA probe, or
//!   distro discovery command)
//! - Auth: Renewable credential with jittered renewal
//! - Source: Incremental trailing-window polling of completed applications
//! - Scheduler: Dispatch loop, worker pool, retry backlog
//! - Services: Analyzer, result store, and metrics collaborators
//!
//! The daemon polls the active ResourceManager for completed applications,
//! analyzes each on a bounded worker pool, retries transient failures a
//! bounded number of times, and drops permanently failing jobs with
//! observability signals.

mod auth;
mod backlog;
mod config;
mod resolver;
mod scheduler;
mod service;
mod source;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yarnscope_client::ResourceManagerClient;

use crate::config::Config;
use crate::scheduler::DispatchDaemon;
use crate::service::{AtomicMetrics, ElapsedTimeAnalyzer, InMemoryResultStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yarnscope_daemon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Yarnscope Daemon");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: ha_enabled={}, fetch_interval={:?}, workers={}",
        config.ha_enabled, config.fetch_interval, config.worker_count
    );

    // Initialize ResourceManager client and collaborators
    let client = Arc::new(ResourceManagerClient::new());
    let analyzer = Arc::new(ElapsedTimeAnalyzer);
    let store = Arc::new(InMemoryResultStore::new());
    let metrics = Arc::new(AtomicMetrics::new());

    // Wire the shutdown signal
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = stop_tx.send(true);
        }
    });

    let mut daemon = DispatchDaemon::new(config, client, analyzer, store, metrics, stop_rx)
        .context("Failed to initialize dispatch daemon")?;

    info!("Daemon initialized successfully");

    if let Err(e) = daemon.run().await {
        error!("Daemon error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
