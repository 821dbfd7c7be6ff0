//! Configuration Module - TOML-based Exporter Configuration
//!
//! Loads and validates configuration from `config.toml`. Snapshot
//! locations, the output textfile and the counter policy are all
//! externalized here.

pub mod loader;

use serde::Deserialize;

use crate::usecases::service_counters::CounterPolicy;

/// Top-level exporter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Exporter identity and engine behaviour.
  pub exporter: ExporterConfig,
  /// Where snapshot documents are read from.
  #[serde(default)]
  pub sources: SourcesConfig,
  /// Where rendered exposition is written to.
  pub output: OutputConfig,
}

/// Exporter identity and engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
  /// Human-readable exporter name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// How repeated counter values are combined.
  #[serde(default)]
  pub counter_policy: CounterPolicy,
}

/// Snapshot document locations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
  /// System-overview JSON document.
  pub system_overview_path: Option<String>,
  /// Service metrics JSON document.
  pub service_metrics_path: Option<String>,
}

/// Exposition output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
  /// Textfile the exposition is written to.
  pub path: String,
  /// Seconds between scrape cycles.
  #[serde(default = "default_interval")]
  pub interval_seconds: u64,
  /// Run a single cycle and exit.
  #[serde(default)]
  pub one_shot: bool,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_interval() -> u64 {
  60
}
