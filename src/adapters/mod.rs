//! Adapters Layer - Port Implementations and Interop
//!
//! - `sources`: snapshot documents read from disk
//! - `sinks`: atomic textfile output
//! - `metrics`: conversion to and from `prometheus` crate families

pub mod metrics;
pub mod sinks;
pub mod sources;
