//! Positional span iterators for proximity search.
//!
//! A span is one occurrence of a query shape in a document: a document id
//! plus a half-open position window. This crate provides the iterator
//! contract ([`Spans`]) and the composites built on it:
//! - [`TermSpans`] adapts one term's position stream
//! - [`OrSpans`] merges several iterators
//! - [`NotSpans`] drops matches close to another iterator's matches
//! - [`FilterSpans`] keeps matches passing a window or payload check
//! - [`OrderedNearSpans`] and [`UnorderedNearSpans`] find proximity matches
//!
//! [`SpanScorer`] folds the matches of one document into a frequency for
//! ranking. Postings come from a [`TermSource`]; [`MemorySegment`] is an
//! in-memory one.
//!
//! # Example
//!
//! ```
//! use nearby_spans::{MemorySegment, OrderedNearSpans, Spans, TermSource, TermSpans};
//!
//! let segment = MemorySegment::from_texts("body", &["nine hundred six", "six nine"]);
//! let term = |text: &str| -> Box<dyn Spans> {
//!     Box::new(TermSpans::new(segment.postings("body", text).unwrap().unwrap()))
//! };
//! let mut near = OrderedNearSpans::new(vec![term("nine"), term("six")], 1, true).unwrap();
//! assert!(near.next());
//! assert_eq!((near.doc(), near.start(), near.end()), (0, 0, 3));
//! assert!(!near.next());
//! ```

#![warn(missing_docs)]

mod error;
mod filter;
mod memory;
mod near;
mod not;
mod or;
mod postings;
mod scorer;
mod spans;
mod term;

pub use error::SpanError;
pub use filter::{
    AcceptStatus, Candidate, FilterSpans, NearPayloadCheck, PayloadCheck, PositionCheck,
    PositionWindow,
};
pub use memory::{MemoryPostings, MemorySegment, Token};
pub use near::{OrderedNearSpans, UnorderedNearSpans};
pub use not::NotSpans;
pub use or::OrSpans;
pub use postings::{PositionStream, TermSource};
pub use scorer::{SimScorer, SpanScorer};
pub use spans::{
    DocId, EmptySpans, Match, Payload, Spans, TERMINATED, collect_matches, ordered_before,
    spans_ordered,
};
pub use term::TermSpans;
