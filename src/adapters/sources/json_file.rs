//! JSON File Source - Snapshots Dropped on Disk
//!
//! Reads the system-overview and service snapshot documents from JSON
//! files written by the upstream fetcher. Either path may be left
//! unconfigured, in which case that snapshot is reported as absent.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::{ServiceSnapshot, SystemOverviewSnapshot};
use crate::ports::snapshot_source::SnapshotSource;

/// File-backed snapshot source.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    /// System-overview document.
    system_overview_path: Option<PathBuf>,
    /// Service metrics document.
    service_metrics_path: Option<PathBuf>,
}

impl JsonFileSource {
    /// Create a source reading from the given files.
    pub fn new(
        system_overview_path: Option<PathBuf>,
        service_metrics_path: Option<PathBuf>,
    ) -> Self {
        Self {
            system_overview_path,
            service_metrics_path,
        }
    }

    #[instrument(skip(path), fields(path = %path.display()))]
    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let parsed = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))?;
        debug!(bytes = content.len(), "Snapshot file loaded");
        Ok(parsed)
    }
}

#[async_trait]
impl SnapshotSource for JsonFileSource {
    async fn system_overview(&self) -> Result<Option<SystemOverviewSnapshot>> {
        match &self.system_overview_path {
            Some(path) => Self::read_json(path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn service_metrics(&self) -> Result<Option<ServiceSnapshot>> {
        match &self.service_metrics_path {
            Some(path) => Self::read_json(path).await.map(Some),
            None => Ok(None),
        }
    }
}
