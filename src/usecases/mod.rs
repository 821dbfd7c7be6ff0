//! Use Cases - Mapping, Merging and the Scrape Cycle
//!
//! Orchestrates the domain registry:
//! - `SystemOverviewMapper`: fleet overview → instance gauges (+ legacy counters)
//! - `ServiceMapper`: per-service totals → request counters
//! - `merge`: combine registries for a unified scrape
//! - `MetricsEngine`: host-facing facade over the above
//! - `ScrapeCycle`: fetch → map → merge → publish loop

pub mod engine;
pub mod merge;
pub mod scrape_cycle;
pub mod service;
pub mod service_counters;
pub mod system_overview;

pub use engine::{EngineOptions, MetricsEngine};
pub use merge::{MergeOptions, Merged};
pub use scrape_cycle::{CycleReport, ScrapeCycle};
pub use service::ServiceMapper;
pub use service_counters::CounterPolicy;
pub use system_overview::SystemOverviewMapper;
