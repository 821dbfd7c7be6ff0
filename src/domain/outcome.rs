//! Invocation outcome tag.
//!
//! Hosts route on `next` / `error` rather than on the Rust type of the
//! returned value.

use std::fmt;

use super::error::MetricsError;

/// Routing tag attached to every engine operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded; the value is a registry or rendered text.
    Next,
    /// The operation failed; the value is a [`MetricsError`].
    Error,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Derives the [`Outcome`] from an engine result.
pub trait OutcomeExt {
    /// `Next` for `Ok`, `Error` for `Err`.
    fn outcome(&self) -> Outcome;
}

impl<T> OutcomeExt for Result<T, MetricsError> {
    fn outcome(&self) -> Outcome {
        match self {
            Ok(_) => Outcome::Next,
            Err(_) => Outcome::Error,
        }
    }
}
