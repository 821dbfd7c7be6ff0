//! Monitoring Snapshot Records
//!
//! Explicit shapes for the two upstream monitoring payloads. Required
//! fields are plain values, optional readings are `Option`s so an
//! absent field can be told apart from an explicit zero.

use serde::{Deserialize, Serialize};

/// Fleet-level overview: one record per gateway instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemOverviewSnapshot {
  /// Gateway instance records.
  #[serde(default)]
  pub instances: Vec<InstanceOverview>,
}

/// Resource readings of a single gateway instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceOverview {
  /// Instance name (the `instance` label).
  pub instance: String,
  /// Current CPU usage (percent).
  pub cpu_used: Option<f64>,
  /// Average CPU usage over the upstream interval.
  pub cpu_used_avg: Option<f64>,
  /// Peak CPU usage over the upstream interval.
  pub cpu_used_max: Option<f64>,
  /// Host memory in use (bytes).
  pub system_memory_used: Option<f64>,
  /// Host memory total (bytes).
  pub system_memory_total: Option<f64>,
  /// JVM heap in use (bytes).
  pub memory_used: Option<f64>,
  /// Disk in use (percent).
  pub disk_used: Option<f64>,
  /// Whether the instance reports itself as up.
  pub status_up: Option<bool>,
  /// Per-service request counters misplaced in this payload upstream.
  #[serde(default)]
  pub services: Vec<LegacyServiceCounters>,
}

/// Request counters for one service, embedded in an overview record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyServiceCounters {
  /// Instance reporting these counters, when it differs from the
  /// enclosing record (upstream reports the traffic pod name here).
  pub instance: Option<String>,
  /// Service name (the `service` label).
  pub service: String,
  /// Successful requests.
  pub successes: u64,
  /// Failed requests.
  pub failures: u64,
  /// Requests that raised an exception.
  pub exceptions: u64,
}

/// Per-service snapshot: one record per service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
  /// Service records.
  #[serde(default)]
  pub services: Vec<ServiceRecord>,
}

/// A service and its per-instance request breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
  /// Service name (the `service` label).
  pub service: String,
  /// One entry per gateway instance hosting the service.
  #[serde(default)]
  pub instances: Vec<ServiceInstanceCounters>,
}

/// Cumulative request totals of one service on one instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstanceCounters {
  /// Instance name (the `instance` label).
  pub instance: String,
  /// All requests, when the upstream reports it.
  pub total: Option<u64>,
  /// Successful requests.
  pub successes: u64,
  /// Failed requests.
  pub failures: u64,
  /// Requests that raised an exception.
  pub exceptions: u64,
}
