//! Metrics Interop Adapters
//!
//! Conversion between the engine registry and the `prometheus` crate's
//! gathered protobuf families.

pub mod prometheus;

pub use self::prometheus::{from_gathered, to_gathered};
