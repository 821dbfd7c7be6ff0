//! Scrape Cycle - Fetch, Map, Merge, Publish
//!
//! One cycle pulls the latest snapshots from a [`SnapshotSource`], feeds
//! them through the engine's mappers, merges all registries with
//! rendering enabled, and hands the text to a [`MetricsSink`].
//!
//! A mapper returning the `error` outcome does not abort the cycle: the
//! previous state of that registry is still published.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::{Outcome, OutcomeExt};
use crate::ports::metrics_sink::MetricsSink;
use crate::ports::snapshot_source::SnapshotSource;

use super::engine::MetricsEngine;
use super::merge::{MergeOptions, Merged};

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
  /// Outcome of the system-overview mapper, if a snapshot was fetched.
  pub system_overview: Option<Outcome>,
  /// Outcome of the service mapper, if a snapshot was fetched.
  pub service: Option<Outcome>,
  /// Size of the published exposition text.
  pub bytes: usize,
}

/// Periodic driver wiring a source, the engine and a sink together.
pub struct ScrapeCycle<S: SnapshotSource, K: MetricsSink> {
  /// Upstream snapshot provider.
  source: Arc<S>,
  /// Rendered output consumer.
  sink: Arc<K>,
  /// Mapping and merge engine.
  engine: Arc<MetricsEngine>,
  /// Delay between cycles.
  interval: Duration,
}

impl<S: SnapshotSource, K: MetricsSink> ScrapeCycle<S, K> {
  /// Create a new scrape cycle.
  pub fn new(
    source: Arc<S>,
    sink: Arc<K>,
    engine: Arc<MetricsEngine>,
    interval: Duration,
  ) -> Self {
    Self {
      source,
      sink,
      engine,
      interval,
    }
  }

  /// Run a single fetch → map → merge → publish pass.
  ///
  /// # Errors
  /// Fetch failures, merge conflicts and sink failures.
  #[instrument(skip(self))]
  pub async fn run_once(&self) -> Result<CycleReport> {
    let overview = self
      .source
      .system_overview()
      .await
      .context("Failed to fetch system overview snapshot")?;
    let system_overview = overview.map(|snapshot| {
      let result = self.engine.process_system_overview_metrics(Some(&snapshot));
      if let Err(e) = &result {
        warn!(error = %e, "System overview mapping failed");
      }
      result.outcome()
    });

    let services = self
      .source
      .service_metrics()
      .await
      .context("Failed to fetch service snapshot")?;
    let service = services.map(|snapshot| {
      let result = self.engine.process_service_metrics(Some(&snapshot));
      if let Err(e) = &result {
        warn!(error = %e, "Service mapping failed");
      }
      result.outcome()
    });

    let merged = self
      .engine
      .merge_registries(MergeOptions { return_metrics: true })
      .context("Failed to merge metric registries")?;
    let text = match merged {
      Merged::Text(text) => text,
      Merged::Registry(_) => anyhow::bail!("Merge did not render exposition text"),
    };

    self.sink
      .publish(&text)
      .await
      .context("Failed to publish exposition")?;

    let report = CycleReport {
      system_overview,
      service,
      bytes: text.len(),
    };
    info!(
      system_overview = ?report.system_overview,
      service = ?report.service,
      bytes = report.bytes,
      "Scrape cycle complete"
    );
    Ok(report)
  }

  /// Run cycles every `interval` until shutdown.
  ///
  /// A failed cycle is logged and retried on the next tick.
  #[instrument(skip(self, shutdown_rx))]
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    info!(
      interval_secs = self.interval.as_secs(),
      "Scrape cycle started"
    );

    loop {
      if let Err(e) = self.run_once().await {
        warn!(error = %e, "Scrape cycle failed");
      }

      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Scrape cycle shutting down");
          return Ok(());
        }
        () = tokio::time::sleep(self.interval) => {}
      }
    }
  }
}
