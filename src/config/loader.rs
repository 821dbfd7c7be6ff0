//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.exporter.name,
    policy = ?config.exporter.counter_policy,
    output = %config.output.path,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
///
/// # Errors
/// TOML parsing failures and validation failures.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - At least one snapshot source
/// - Non-empty paths
/// - A positive scrape interval
fn validate_config(config: &AppConfig) -> Result<()> {
  let sources = &config.sources;
  anyhow::ensure!(
    sources.system_overview_path.is_some() || sources.service_metrics_path.is_some(),
    "At least one of sources.system_overview_path or sources.service_metrics_path must be set"
  );

  for (key, path) in [
    ("system_overview_path", &sources.system_overview_path),
    ("service_metrics_path", &sources.service_metrics_path),
  ] {
    anyhow::ensure!(
      path.as_deref().is_none_or(|p| !p.is_empty()),
      "sources.{} must not be empty",
      key
    );
  }

  anyhow::ensure!(
    !config.output.path.is_empty(),
    "output.path must not be empty"
  );
  anyhow::ensure!(
    config.output.interval_seconds > 0,
    "output.interval_seconds must be positive, got {}",
    config.output.interval_seconds
  );

  Ok(())
}
