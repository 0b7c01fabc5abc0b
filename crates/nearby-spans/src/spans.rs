//! The span iterator contract.
//!
//! A [`Spans`] is a pull cursor over a lazily produced sequence of matches.
//! Matches are enumerated by increasing document id, then by increasing start
//! position, then by increasing end position. Every composite in this crate
//! both consumes and implements the contract, so composites nest freely.

use std::fmt;

/// Document identifier within one segment.
pub type DocId = u32;

/// Sentinel document id reported by exhausted document cursors.
pub const TERMINATED: DocId = i32::MAX as u32;

/// Opaque bytes attached to one indexed position.
pub type Payload = Vec<u8>;

/// One occurrence of a query shape in one document.
///
/// `start` is inclusive and `end` is exclusive, so a single-position term
/// match at position `p` is `[p, p + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Match {
    /// Document the match occurs in.
    pub doc: DocId,
    /// First position covered by the match.
    pub start: u32,
    /// One past the last position covered by the match.
    pub end: u32,
}

impl Match {
    /// Creates a match.
    pub fn new(doc: DocId, start: u32, end: u32) -> Self {
        debug_assert!(start < end, "match [{start}, {end}) is empty");
        Self { doc, start, end }
    }

    /// Number of positions covered by the match.
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc {} [{}, {})", self.doc, self.start, self.end)
    }
}

/// A cursor over matches of a query shape within one segment.
///
/// Accessors are only meaningful after [`next`](Self::next) or
/// [`skip_to`](Self::skip_to) returned `true`. Once either returns `false`
/// the iterator is exhausted for good.
pub trait Spans: Send {
    /// Moves to the next match. Returns `false` once exhausted.
    fn next(&mut self) -> bool;

    /// Moves to the first match whose document is `>= target`.
    ///
    /// Callers must only skip forward: `target` has to be greater than the
    /// current document. The result is identical to calling
    /// [`next`](Self::next) until the document condition holds.
    fn skip_to(&mut self, target: DocId) -> bool;

    /// Document of the current match.
    fn doc(&self) -> DocId;

    /// Inclusive start position of the current match.
    fn start(&self) -> u32;

    /// Exclusive end position of the current match.
    fn end(&self) -> u32;

    /// Hands over the payloads of the current match.
    ///
    /// Reading consumes: a second call for the same match returns an empty
    /// collection. Calling this is optional.
    fn take_payload(&mut self) -> Vec<Payload>;

    /// Whether the current match still has an unread payload.
    fn is_payload_available(&self) -> bool;

    /// Rough upper bound on the number of remaining matches.
    ///
    /// Only used to pick merge strategies, never for correctness.
    fn cost(&self) -> u64;

    /// The current match as a value.
    fn current(&self) -> Match {
        Match {
            doc: self.doc(),
            start: self.start(),
            end: self.end(),
        }
    }
}

impl<S: Spans + ?Sized> Spans for Box<S> {
    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        (**self).skip_to(target)
    }

    fn doc(&self) -> DocId {
        (**self).doc()
    }

    fn start(&self) -> u32 {
        (**self).start()
    }

    fn end(&self) -> u32 {
        (**self).end()
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        (**self).take_payload()
    }

    fn is_payload_available(&self) -> bool {
        (**self).is_payload_available()
    }

    fn cost(&self) -> u64 {
        (**self).cost()
    }

    fn current(&self) -> Match {
        (**self).current()
    }
}

/// Whether `[a_start, a_end)` sorts strictly before `[b_start, b_end)`.
///
/// Earlier starts come first; equal starts are ordered by end.
pub fn ordered_before(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    if a_start == b_start {
        a_end < b_end
    } else {
        a_start < b_start
    }
}

/// Whether the current match of `a` sorts strictly before that of `b`.
///
/// Both iterators must be positioned in the same document.
pub fn spans_ordered(a: &dyn Spans, b: &dyn Spans) -> bool {
    debug_assert_eq!(a.doc(), b.doc());
    ordered_before(a.start(), a.end(), b.start(), b.end())
}

/// Drains every remaining match from `spans`.
pub fn collect_matches(spans: &mut dyn Spans) -> Vec<Match> {
    let mut matches = Vec::new();
    while spans.next() {
        matches.push(spans.current());
    }
    matches
}

/// Spans that never match.
///
/// Stands in for a term that does not occur in a segment, so queries that
/// reference it simply produce no matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySpans;

impl Spans for EmptySpans {
    fn next(&mut self) -> bool {
        false
    }

    fn skip_to(&mut self, _target: DocId) -> bool {
        false
    }

    fn doc(&self) -> DocId {
        TERMINATED
    }

    fn start(&self) -> u32 {
        0
    }

    fn end(&self) -> u32 {
        0
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        Vec::new()
    }

    fn is_payload_available(&self) -> bool {
        false
    }

    fn cost(&self) -> u64 {
        0
    }
}
