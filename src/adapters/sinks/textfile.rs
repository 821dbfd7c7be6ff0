//! Textfile Sink - Atomic Exposition File
//!
//! Writes the rendered exposition to a `.prom` file using atomic writes
//! (write to tmp file, then rename), so a collector reading the file
//! never sees a partially written snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::ports::metrics_sink::MetricsSink;

/// Atomic textfile writer for exposition snapshots.
pub struct TextfileSink {
    /// Final exposition path.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl TextfileSink {
    /// Create a sink writing to `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .context("Failed to create output directory")?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        Ok(Self { path, tmp_path })
    }

    /// Final exposition path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsSink for TextfileSink {
    #[instrument(skip(self, exposition), fields(path = %self.path.display()))]
    async fn publish(&self, exposition: &str) -> Result<()> {
        fs::write(&self.tmp_path, exposition)
            .await
            .context("Failed to write tmp exposition file")?;

        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename exposition file")?;

        debug!(bytes = exposition.len(), "Exposition published");
        Ok(())
    }
}
