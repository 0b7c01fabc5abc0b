//! Leaf span iterator over one term's position stream.

use crate::{
    postings::{PositionStream, is_terminated},
    spans::{DocId, Payload, Spans},
};

/// Spans of a single term: one width-one match per indexed position.
pub struct TermSpans {
    /// Underlying position stream.
    postings: Box<dyn PositionStream>,
    /// Current document.
    doc: DocId,
    /// Positions of the term in the current document.
    freq: u32,
    /// Positions consumed so far in the current document.
    count: u32,
    /// Current position.
    position: u32,
    /// Whether the payload of the current position is still untaken.
    ///
    /// The stream keeps the payload readable until the next position, so
    /// it is copied out only when taken.
    payload_pending: bool,
}

impl TermSpans {
    /// Wraps an unstarted position stream.
    pub fn new(postings: Box<dyn PositionStream>) -> Self {
        Self {
            postings,
            doc: 0,
            freq: 0,
            count: 0,
            position: 0,
            payload_pending: false,
        }
    }

    /// Enters the document the stream now sits on.
    fn enter_doc(&mut self, doc: DocId) -> bool {
        debug_assert!(
            self.freq == 0 || doc > self.doc || is_terminated(doc),
            "document {doc} after {}",
            self.doc
        );
        self.doc = doc;
        if is_terminated(doc) {
            return false;
        }
        self.freq = self.postings.freq();
        self.count = 0;
        self.next_position();
        true
    }

    /// Consumes the next position of the current document.
    fn next_position(&mut self) {
        let position = self.postings.next_position();
        debug_assert!(
            self.count == 0 || position >= self.position,
            "position {position} after {} in doc {}",
            self.position,
            self.doc
        );
        self.position = position;
        self.count += 1;
        self.payload_pending = true;
    }
}

impl Spans for TermSpans {
    fn next(&mut self) -> bool {
        if self.count == self.freq {
            let doc = self.postings.next_doc();
            return self.enter_doc(doc);
        }
        self.next_position();
        true
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        debug_assert!(
            self.freq == 0 || target > self.doc,
            "skip_to({target}) from doc {}",
            self.doc
        );
        let doc = self.postings.advance(target);
        self.enter_doc(doc)
    }

    fn doc(&self) -> DocId {
        self.doc
    }

    fn start(&self) -> u32 {
        self.position
    }

    fn end(&self) -> u32 {
        self.position + 1
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        if !self.payload_pending {
            return Vec::new();
        }
        self.payload_pending = false;
        self.postings.payload().map(<[u8]>::to_vec).into_iter().collect()
    }

    fn is_payload_available(&self) -> bool {
        self.payload_pending && self.postings.payload().is_some()
    }

    fn cost(&self) -> u64 {
        self.postings.cost()
    }
}
