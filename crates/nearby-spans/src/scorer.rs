//! Scoring bridge: turns a span iterator into a per-document scorer.

use tracing::trace;

use crate::spans::{DocId, Spans, TERMINATED};

/// Similarity hooks a [`SpanScorer`] needs.
pub trait SimScorer: Send {
    /// Contribution of one match spanning `distance` positions.
    fn slop_factor(&self, distance: u32) -> f32;

    /// Score of `doc` given its accumulated sloppy frequency.
    fn score(&self, doc: DocId, freq: f32) -> f32;
}

/// Coalesces every match of a span iterator in one document into a sloppy
/// frequency and a match count, and scores documents from it.
///
/// Positioned nowhere until the first [`next_doc`](Self::next_doc) or
/// [`advance`](Self::advance).
pub struct SpanScorer<S, Sim> {
    /// Underlying matches.
    spans: S,
    /// Similarity hooks.
    sim: Sim,
    /// Whether `spans` sits on an unconsumed match.
    more: bool,
    /// Current document.
    doc: DocId,
    /// Sum of the slop factors of the current document's matches.
    freq: f32,
    /// Number of matches in the current document.
    matches: u32,
}

impl<S: Spans, Sim: SimScorer> SpanScorer<S, Sim> {
    /// Creates a scorer. The first match is read immediately.
    pub fn new(mut spans: S, sim: Sim) -> Self {
        let more = spans.next();
        Self {
            spans,
            sim,
            more,
            doc: 0,
            freq: 0.0,
            matches: 0,
        }
    }

    /// Moves to the next matching document, or [`TERMINATED`].
    pub fn next_doc(&mut self) -> DocId {
        if !self.set_freq_current_doc() {
            self.doc = TERMINATED;
        }
        self.doc
    }

    /// Moves to the first matching document `>= target`, or [`TERMINATED`].
    pub fn advance(&mut self, target: DocId) -> DocId {
        if !self.more {
            self.doc = TERMINATED;
            return self.doc;
        }
        if self.spans.doc() < target {
            self.more = self.spans.skip_to(target);
        }
        self.next_doc()
    }

    /// Current document.
    pub fn doc(&self) -> DocId {
        self.doc
    }

    /// Number of matches in the current document.
    pub fn freq(&self) -> u32 {
        self.matches
    }

    /// Slop-weighted frequency of the current document.
    pub fn sloppy_freq(&self) -> f32 {
        self.freq
    }

    /// Score of the current document.
    pub fn score(&self) -> f32 {
        self.sim.score(self.doc, self.freq)
    }

    /// Estimated number of matching documents.
    pub fn cost(&self) -> u64 {
        self.spans.cost()
    }

    /// Consumes every match of the next document.
    fn set_freq_current_doc(&mut self) -> bool {
        if !self.more {
            return false;
        }
        self.doc = self.spans.doc();
        self.freq = 0.0;
        self.matches = 0;
        loop {
            let distance = self.spans.end() - self.spans.start();
            self.freq += self.sim.slop_factor(distance);
            self.matches += 1;
            self.more = self.spans.next();
            if !self.more || self.spans.doc() != self.doc {
                break;
            }
        }
        trace!(
            doc = self.doc,
            matches = self.matches,
            freq = self.freq,
            "span document scored"
        );
        true
    }
}
