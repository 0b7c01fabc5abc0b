//! Proximity composites: matches where every clause occurs within a slop
//! budget of the others.
//!
//! [`OrderedNearSpans`] additionally requires the clauses to appear in the
//! given order. Both need at least two clauses.

mod ordered;
mod unordered;

pub use ordered::OrderedNearSpans;
pub use unordered::UnorderedNearSpans;

use crate::{error::SpanError, spans::Spans};

/// Rejects clause lists too short for a proximity composite.
fn check_clauses(clauses: &[Box<dyn Spans>]) -> Result<(), SpanError> {
    if clauses.len() < 2 {
        return Err(SpanError::TooFewClauses {
            count: clauses.len(),
        });
    }
    Ok(())
}

/// Lowest cost among `clauses`.
fn min_cost(clauses: &[Box<dyn Spans>]) -> u64 {
    clauses.iter().map(|c| c.cost()).min().unwrap_or(0)
}
