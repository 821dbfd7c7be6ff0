//! Domain layer - Metric registry, snapshot records and exposition.
//!
//! Pure types with no I/O: the registry the mappers write into, the
//! monitoring snapshot shapes they read, the error taxonomy, and the
//! text exposition renderer/parser.

pub mod error;
pub mod exposition;
pub mod outcome;
pub mod registry;
pub mod snapshot;

// Re-export core types for convenience
pub use error::MetricsError;
pub use outcome::{Outcome, OutcomeExt};
pub use registry::{
    FamilyDesc, LabelSet, MetricFamily, MetricKind, Registry, Sample, SharedRegistry,
};
pub use snapshot::{
    InstanceOverview, LegacyServiceCounters, ServiceInstanceCounters, ServiceRecord,
    ServiceSnapshot, SystemOverviewSnapshot,
};
