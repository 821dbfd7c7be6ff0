//! Snapshot Source Port - Upstream Monitoring Data Interface
//!
//! Boundary to whatever fetches monitoring payloads from the API-Gateway
//! monitoring API (HTTP polling, auth, retries). The engine only sees the
//! decoded snapshot records.

use async_trait::async_trait;

use crate::domain::{ServiceSnapshot, SystemOverviewSnapshot};

/// Trait for monitoring snapshot providers.
///
/// A provider returns `Ok(None)` for a payload it is not configured to
/// fetch; transport and decoding failures are errors.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
  /// Latest fleet-level overview.
  async fn system_overview(&self) -> anyhow::Result<Option<SystemOverviewSnapshot>>;

  /// Latest per-service request totals.
  async fn service_metrics(&self) -> anyhow::Result<Option<ServiceSnapshot>>;
}
