//! Metrics Sink Adapters
//!
//! Implementations of the `MetricsSink` port.

pub mod textfile;

pub use textfile::TextfileSink;
