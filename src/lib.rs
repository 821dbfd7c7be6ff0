//! Gateway Metrics Exporter — Library Root
//!
//! Normalizes API-gateway monitoring snapshots into labeled metric
//! registries, merges them, and renders the Prometheus text format.
//! Re-exports all modules for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
