//! Gateway Metrics Exporter — Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create MetricsEngine (owned system-overview + service registries)
//! 4. Create JsonFileSource (SnapshotSource port) and TextfileSink (MetricsSink port)
//! 5. One-shot: run a single cycle and exit
//! 6. Otherwise spawn the ScrapeCycle loop and wait for SIGINT → graceful shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use gateway_metrics_exporter::adapters::sinks::TextfileSink;
use gateway_metrics_exporter::adapters::sources::JsonFileSource;
use gateway_metrics_exporter::config;
use gateway_metrics_exporter::usecases::{EngineOptions, MetricsEngine, ScrapeCycle};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.exporter.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.exporter.name,
        version = env!("CARGO_PKG_VERSION"),
        policy = ?config.exporter.counter_policy,
        one_shot = config.output.one_shot,
        "Starting gateway metrics exporter"
    );

    // ── 3. Engine with fresh owned registries ───────────────
    let engine = Arc::new(MetricsEngine::new(EngineOptions {
        counter_policy: config.exporter.counter_policy,
        registries: Vec::new(),
    }));

    // ── 4. Source and sink adapters ─────────────────────────
    let source = Arc::new(JsonFileSource::new(
        config.sources.system_overview_path.as_ref().map(PathBuf::from),
        config.sources.service_metrics_path.as_ref().map(PathBuf::from),
    ));
    let sink = Arc::new(
        TextfileSink::new(&config.output.path)
            .await
            .context("Failed to create textfile sink")?,
    );

    let cycle = Arc::new(ScrapeCycle::new(
        source,
        sink,
        engine,
        Duration::from_secs(config.output.interval_seconds),
    ));

    // ── 5. One-shot mode ────────────────────────────────────
    if config.output.one_shot {
        let report = cycle.run_once().await?;
        info!(bytes = report.bytes, "One-shot cycle complete");
        return Ok(());
    }

    // ── 6. Periodic mode ────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let cycle_ref = Arc::clone(&cycle);
    let cycle_handle = tokio::spawn(async move {
        if let Err(e) = cycle_ref.run(shutdown_rx).await {
            error!(error = %e, "Scrape cycle task failed");
        }
    });

    info!("Scrape cycle spawned — exporter is running");

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(10), cycle_handle).await;

    info!("Shutdown complete");
    Ok(())
}
