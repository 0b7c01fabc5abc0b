//! Position filters: wrap one iterator and keep only the matches a
//! [`PositionCheck`] accepts.

mod payload;
mod window;

pub use payload::{NearPayloadCheck, PayloadCheck};
pub use window::PositionWindow;

use crate::spans::{DocId, Payload, Spans};

/// Verdict of a [`PositionCheck`] on one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptStatus {
    /// Keep the match.
    Yes,
    /// Drop the match and try the next one.
    No,
    /// Drop the match and every later match in the same document.
    NoAndAdvance,
}

/// Predicate deciding which matches a [`FilterSpans`] keeps.
pub trait PositionCheck: Send {
    /// Judges the candidate's current match.
    fn accept(&self, candidate: &mut Candidate<'_>) -> AcceptStatus;
}

/// The wrapped iterator's current match, as seen by a [`PositionCheck`].
///
/// Reading the payload through the candidate keeps it available to whoever
/// consumes the filtered match afterwards.
pub struct Candidate<'a> {
    /// Wrapped iterator.
    spans: &'a mut dyn Spans,
    /// Payload read by the check, if it read one.
    payload: &'a mut Option<Vec<Payload>>,
}

impl Candidate<'_> {
    /// Document of the match.
    pub fn doc(&self) -> DocId {
        self.spans.doc()
    }

    /// Inclusive start of the match.
    pub fn start(&self) -> u32 {
        self.spans.start()
    }

    /// Exclusive end of the match.
    pub fn end(&self) -> u32 {
        self.spans.end()
    }

    /// Whether the match carries a payload.
    pub fn has_payload(&self) -> bool {
        self.payload
            .as_ref()
            .map_or_else(|| self.spans.is_payload_available(), |p| !p.is_empty())
    }

    /// Payloads of the match, loaded on first access.
    pub fn payload(&mut self) -> &[Payload] {
        let spans = &mut *self.spans;
        self.payload.get_or_insert_with(|| spans.take_payload())
    }
}

/// Matches of one iterator that pass a [`PositionCheck`].
pub struct FilterSpans<C> {
    /// Wrapped iterator.
    inner: Box<dyn Spans>,
    /// Acceptance predicate.
    check: C,
    /// Payload the check loaded for the current match.
    stash: Option<Vec<Payload>>,
}

impl<C: PositionCheck> FilterSpans<C> {
    /// Filters `inner` through `check`.
    pub fn new(inner: Box<dyn Spans>, check: C) -> Self {
        Self {
            inner,
            check,
            stash: None,
        }
    }

    /// Runs the check until it accepts or `inner` runs out.
    fn settle(&mut self, mut more: bool) -> bool {
        while more {
            self.stash = None;
            let mut candidate = Candidate {
                spans: &mut *self.inner,
                payload: &mut self.stash,
            };
            match self.check.accept(&mut candidate) {
                AcceptStatus::Yes => return true,
                AcceptStatus::No => more = self.inner.next(),
                AcceptStatus::NoAndAdvance => {
                    let next_doc = self.inner.doc() + 1;
                    more = self.inner.skip_to(next_doc);
                }
            }
        }
        self.stash = None;
        false
    }
}

impl<C: PositionCheck> Spans for FilterSpans<C> {
    fn next(&mut self) -> bool {
        let more = self.inner.next();
        self.settle(more)
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        let more = self.inner.skip_to(target);
        self.settle(more)
    }

    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn start(&self) -> u32 {
        self.inner.start()
    }

    fn end(&self) -> u32 {
        self.inner.end()
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        match self.stash.take() {
            Some(payload) => payload,
            None => self.inner.take_payload(),
        }
    }

    fn is_payload_available(&self) -> bool {
        self.stash
            .as_ref()
            .map_or_else(|| self.inner.is_payload_available(), |p| !p.is_empty())
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }
}
