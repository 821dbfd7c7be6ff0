//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SnapshotSource`: Upstream monitoring snapshots
//! - `MetricsSink`: Rendered exposition output

pub mod metrics_sink;
pub mod snapshot_source;
