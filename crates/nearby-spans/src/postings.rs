//! Contracts consumed from the index-reading collaborator.
//!
//! The engine never decodes postings itself. A [`TermSource`] resolves a
//! term in one segment to a [`PositionStream`], and the leaf iterator in
//! [`crate::term`] adapts that stream to the span contract.

use crate::{
    error::SpanError,
    spans::{DocId, TERMINATED},
};

/// Per-document position stream of one term in one segment.
///
/// A fresh stream is unstarted: [`doc`](Self::doc) is meaningless until the
/// first call to [`next_doc`](Self::next_doc) or [`advance`](Self::advance).
/// Both return [`TERMINATED`] once the stream runs out.
pub trait PositionStream: Send {
    /// Moves to the next document containing the term.
    fn next_doc(&mut self) -> DocId;

    /// Moves to the first document `>= target`.
    fn advance(&mut self, target: DocId) -> DocId;

    /// Current document.
    fn doc(&self) -> DocId;

    /// Number of positions of the term in the current document.
    fn freq(&self) -> u32;

    /// Returns the next position within the current document.
    ///
    /// Must be called at most [`freq`](Self::freq) times per document.
    /// Positions come back in increasing order.
    fn next_position(&mut self) -> u32;

    /// Payload stored at the position last returned by
    /// [`next_position`](Self::next_position), if any.
    fn payload(&self) -> Option<&[u8]>;

    /// Number of documents the stream may still produce.
    fn cost(&self) -> u64;
}

/// Resolves terms of one segment to position streams.
pub trait TermSource {
    /// Opens the position stream for `text` in `field`.
    ///
    /// Returns `Ok(None)` when the term does not occur in the segment, and
    /// an error when the field is unknown or lacks positions.
    fn postings(
        &self,
        field: &str,
        text: &str,
    ) -> Result<Option<Box<dyn PositionStream>>, SpanError>;
}

/// Whether a document id returned by a stream marks exhaustion.
pub fn is_terminated(doc: DocId) -> bool {
    doc == TERMINATED
}
