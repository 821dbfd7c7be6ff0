//! Metrics Engine Errors
//!
//! Every expected failure of the mapping, registry and merge operations
//! is returned as a `MetricsError` value. Hosts branch on the
//! [`Outcome`](super::outcome::Outcome) derived from the result instead
//! of catching panics.

use thiserror::Error;

/// Errors produced by the registry, mappers, merger and text parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// A required snapshot argument was absent or empty.
    ///
    /// The message format is relied on verbatim by hosts.
    #[error("Missing required parameter {0}")]
    MissingParameter(&'static str),

    /// Two families share a name but differ in type, help or labels.
    #[error("metric family {name} already registered with different {reason}")]
    Conflict {
        /// Family name.
        name: String,
        /// Which part of the metadata differs.
        reason: String,
    },

    /// No family with this name exists in the registry.
    #[error("metric family {name} not found")]
    NotFound {
        /// Family name.
        name: String,
    },

    /// The family exists but holds no sample for this label set.
    #[error("metric family {name} has no sample for labels {labels}")]
    SampleNotFound {
        /// Family name.
        name: String,
        /// Rendered label set.
        labels: String,
    },

    /// A label set does not carry exactly the family's label names.
    #[error("metric family {name} expects labels [{expected}], got [{got}]")]
    LabelMismatch {
        /// Family name.
        name: String,
        /// Declared label names, comma separated.
        expected: String,
        /// Supplied label names, comma separated.
        got: String,
    },

    /// Only gauges and counters can be held by a registry.
    #[error("metric family {name} has unsupported type {kind}")]
    UnsupportedType {
        /// Family name.
        name: String,
        /// The rejected type.
        kind: String,
    },

    /// Exposition text could not be parsed.
    #[error("invalid exposition text at line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },
}

impl MetricsError {
    pub(crate) fn conflict(name: &str, reason: impl Into<String>) -> Self {
        Self::Conflict {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }
}
