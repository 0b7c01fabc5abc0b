//! Union of span iterators.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, binary_heap::PeekMut},
};

use crate::spans::{DocId, Payload, Spans, TERMINATED};

/// A child iterator together with a snapshot of its current match.
///
/// The heap orders by the snapshot, so it must be refreshed whenever the
/// child moves.
struct QueueEntry {
    /// Snapshot of the child's document.
    doc: DocId,
    /// Snapshot of the child's start.
    start: u32,
    /// Snapshot of the child's end.
    end: u32,
    /// The child itself.
    spans: Box<dyn Spans>,
}

impl QueueEntry {
    /// Wraps a child already positioned on a match.
    fn new(spans: Box<dyn Spans>) -> Self {
        let mut entry = Self {
            doc: 0,
            start: 0,
            end: 0,
            spans,
        };
        entry.refresh();
        entry
    }

    /// Re-reads the child's current match.
    fn refresh(&mut self) {
        self.doc = self.spans.doc();
        self.start = self.spans.start();
        self.end = self.spans.end();
    }

    /// Sort key.
    fn key(&self) -> (DocId, u32, u32) {
        (self.doc, self.start, self.end)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed: `BinaryHeap` is a max-heap and the union wants the minimum.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Matches of any child, merged in (doc, start, end) order.
///
/// Identical matches from different children are all reported. The merge
/// queue is built on the first advance, so children that are never visited
/// are never started.
pub struct OrSpans {
    /// Children not yet started.
    pending: Vec<Box<dyn Spans>>,
    /// Started children with matches left, `None` until the first advance.
    queue: Option<BinaryHeap<QueueEntry>>,
    /// Sum of the children's costs at construction.
    cost: u64,
}

impl OrSpans {
    /// Creates the union of `clauses`.
    pub fn new(clauses: Vec<Box<dyn Spans>>) -> Self {
        let cost = clauses.iter().map(|c| c.cost()).sum();
        Self {
            pending: clauses,
            queue: None,
            cost,
        }
    }

    /// Starts every child, by `next` or by skipping to `target`.
    fn init_queue(&mut self, target: Option<DocId>) -> bool {
        let mut queue = BinaryHeap::with_capacity(self.pending.len());
        for mut spans in self.pending.drain(..) {
            let more = match target {
                Some(target) => spans.skip_to(target),
                None => spans.next(),
            };
            if more {
                queue.push(QueueEntry::new(spans));
            }
        }
        let more = !queue.is_empty();
        self.queue = Some(queue);
        more
    }

    /// Entry holding the current match.
    fn top(&self) -> Option<&QueueEntry> {
        self.queue.as_ref().and_then(BinaryHeap::peek)
    }
}

impl Spans for OrSpans {
    fn next(&mut self) -> bool {
        let Some(queue) = self.queue.as_mut() else {
            return self.init_queue(None);
        };
        let Some(mut top) = queue.peek_mut() else {
            return false;
        };
        if top.spans.next() {
            top.refresh();
            return true;
        }
        PeekMut::pop(top);
        !queue.is_empty()
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        let Some(queue) = self.queue.as_mut() else {
            return self.init_queue(Some(target));
        };
        let mut skipped = false;
        while let Some(mut top) = queue.peek_mut() {
            if top.doc >= target {
                break;
            }
            if top.spans.skip_to(target) {
                top.refresh();
            } else {
                PeekMut::pop(top);
            }
            skipped = true;
        }
        if skipped {
            return !queue.is_empty();
        }
        self.next()
    }

    fn doc(&self) -> DocId {
        self.top().map_or(TERMINATED, |e| e.doc)
    }

    fn start(&self) -> u32 {
        self.top().map_or(0, |e| e.start)
    }

    fn end(&self) -> u32 {
        self.top().map_or(0, |e| e.end)
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        match self.queue.as_mut().and_then(BinaryHeap::peek_mut) {
            Some(mut top) => top.spans.take_payload(),
            None => Vec::new(),
        }
    }

    fn is_payload_available(&self) -> bool {
        self.top().is_some_and(|e| e.spans.is_payload_available())
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}
