//! Error types for the nearby-spans crate.

use std::fmt;

use thiserror::Error;

/// Errors raised while building span iterators.
///
/// Iteration itself never fails: once an iterator exists, running out of
/// matches is the only way it stops. Everything here surfaces at
/// construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// A proximity composite was given fewer than two clauses.
    #[error("proximity needs at least 2 clauses, got {count}")]
    TooFewClauses {
        /// Number of clauses supplied.
        count: usize,
    },

    /// The term source does not know the requested field.
    #[error("unknown field: {field}")]
    UnknownField {
        /// Field name as requested.
        field: String,
    },

    /// The field exists but was indexed without position information.
    #[error("field '{field}' was indexed without positions; span queries cannot run on it")]
    PositionsNotIndexed {
        /// Field name as requested.
        field: String,
    },

    /// The index-reading collaborator failed.
    #[error("index read failed: {message}")]
    Index {
        /// Error message reported by the collaborator.
        message: String,
    },
}

impl SpanError {
    /// Creates an `Index` error from any displayable upstream error.
    pub fn index(source: &impl fmt::Display) -> Self {
        Self::Index {
            message: source.to_string(),
        }
    }
}
