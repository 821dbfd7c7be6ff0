//! Snapshot Source Adapters
//!
//! Implementations of the `SnapshotSource` port.

pub mod json_file;

pub use json_file::JsonFileSource;
