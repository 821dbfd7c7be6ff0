//! Metrics Sink Port - Rendered Exposition Output
//!
//! Where a scrape cycle delivers the rendered exposition text: a textfile
//! picked up by a node exporter, a buffer served by a host listener, etc.

use async_trait::async_trait;

/// Trait for consumers of rendered exposition text.
#[async_trait]
pub trait MetricsSink: Send + Sync + 'static {
  /// Publish one complete exposition snapshot, replacing the previous one.
  async fn publish(&self, exposition: &str) -> anyhow::Result<()>;
}
