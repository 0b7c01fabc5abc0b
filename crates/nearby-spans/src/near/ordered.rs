//! Ordered proximity.

use std::mem;

use super::{check_clauses, min_cost};
use crate::{
    error::SpanError,
    spans::{DocId, Payload, Spans, TERMINATED, ordered_before},
};

/// Where the ordered proximity search stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No clause has been advanced yet.
    Unstarted,
    /// Clauses may sit in different documents and must be aligned.
    Aligning,
    /// All clauses share `match_doc`; they must be put in order and shrunk.
    Ordering,
    /// Some clause ran out; no further matches.
    Exhausted,
}

/// Matches where each clause occurs after the previous one, with at most
/// `slop` unmatched positions between consecutive clauses in total.
///
/// Overlapping clause matches do not count towards the slop. For each
/// candidate the earlier clauses are moved as close as possible to the
/// clause after them, so reported matches are the tightest ordered ones.
/// After a match the earlier clauses already sit past it, which is what the
/// next call resumes from.
pub struct OrderedNearSpans {
    /// Clause iterators, in the required order.
    clauses: Vec<Box<dyn Spans>>,
    /// Clause indexes, sorted by document while aligning.
    by_doc: Vec<usize>,
    /// Allowed slop.
    slop: u32,
    /// Whether payloads of the matching positions are collected.
    collect_payloads: bool,
    /// Search state.
    phase: Phase,
    /// Document of the current match.
    match_doc: DocId,
    /// Start of the current match.
    match_start: u32,
    /// End of the current match.
    match_end: u32,
    /// Payloads retained per clause while shrinking.
    candidates: Vec<Vec<Payload>>,
    /// Payloads of the current match, in clause order.
    payload: Vec<Payload>,
    /// Lowest clause cost.
    cost: u64,
}

impl OrderedNearSpans {
    /// Creates an ordered proximity over `clauses`.
    ///
    /// Fails when fewer than two clauses are given.
    pub fn new(
        clauses: Vec<Box<dyn Spans>>,
        slop: u32,
        collect_payloads: bool,
    ) -> Result<Self, SpanError> {
        check_clauses(&clauses)?;
        let count = clauses.len();
        Ok(Self {
            cost: min_cost(&clauses),
            clauses,
            by_doc: (0..count).collect(),
            slop,
            collect_payloads,
            phase: Phase::Unstarted,
            match_doc: TERMINATED,
            match_start: 0,
            match_end: 0,
            candidates: vec![Vec::new(); count],
            payload: Vec::new(),
        })
    }

    /// Runs the search from the current phase until a match or exhaustion.
    fn advance_after_ordered(&mut self) -> bool {
        loop {
            match self.phase {
                Phase::Unstarted | Phase::Exhausted => return false,
                Phase::Aligning => self.phase = self.to_same_doc(),
                Phase::Ordering => {
                    if self.stretch_to_order() && self.shrink_to_after_shortest_match() {
                        return true;
                    }
                }
            }
        }
    }

    /// Skips lagging clauses until all share one document.
    fn to_same_doc(&mut self) -> Phase {
        let clauses = &mut self.clauses;
        self.by_doc.sort_by_key(|&i| clauses[i].doc());
        let count = self.by_doc.len();
        let mut first = 0;
        let mut max_doc = clauses[self.by_doc[count - 1]].doc();
        while clauses[self.by_doc[first]].doc() != max_doc {
            let clause = &mut clauses[self.by_doc[first]];
            if !clause.skip_to(max_doc) {
                return Phase::Exhausted;
            }
            max_doc = clause.doc();
            first = (first + 1) % count;
        }
        Phase::Ordering
    }

    /// Advances later clauses until every clause is ordered after the
    /// previous one. Returns `false` when a clause leaves the document.
    fn stretch_to_order(&mut self) -> bool {
        self.match_doc = self.clauses[0].doc();
        for i in 1..self.clauses.len() {
            let (before, after) = self.clauses.split_at_mut(i);
            let prev = &before[i - 1];
            let clause = &mut after[0];
            while !ordered_before(prev.start(), prev.end(), clause.start(), clause.end()) {
                if !clause.next() {
                    self.phase = Phase::Exhausted;
                    return false;
                }
                if clause.doc() != self.match_doc {
                    self.phase = Phase::Aligning;
                    return false;
                }
            }
        }
        true
    }

    /// Moves each earlier clause as close as it can get to the clause after
    /// it, right to left, and checks the resulting slop.
    ///
    /// Every earlier clause ends up advanced past the match, whether or not
    /// the slop fits, so the next search never revisits this alignment.
    fn shrink_to_after_shortest_match(&mut self) -> bool {
        let last = self.clauses.len() - 1;
        self.match_start = self.clauses[last].start();
        self.match_end = self.clauses[last].end();
        if self.collect_payloads {
            for candidate in &mut self.candidates {
                candidate.clear();
            }
            self.candidates[last] = self.clauses[last].take_payload();
        }

        let mut exhausted = false;
        let mut left_doc = false;
        let mut match_slop: u64 = 0;
        let mut last_start = self.match_start;
        let mut last_end = self.match_end;
        for i in (0..last).rev() {
            let prev = &mut self.clauses[i];
            if self.collect_payloads {
                self.candidates[i] = prev.take_payload();
            }
            let mut prev_start = prev.start();
            let mut prev_end = prev.end();
            loop {
                if !prev.next() {
                    exhausted = true;
                    break;
                }
                if prev.doc() != self.match_doc {
                    left_doc = true;
                    break;
                }
                let (start, end) = (prev.start(), prev.end());
                if !ordered_before(start, end, last_start, last_end) {
                    break;
                }
                prev_start = start;
                prev_end = end;
                if self.collect_payloads {
                    self.candidates[i] = prev.take_payload();
                }
            }

            debug_assert!(prev_start <= self.match_start);
            // Only gaps between non-overlapping clauses count.
            if self.match_start > prev_end {
                match_slop += u64::from(self.match_start - prev_end);
            }
            self.match_start = prev_start;
            last_start = prev_start;
            last_end = prev_end;
        }

        self.phase = if exhausted {
            Phase::Exhausted
        } else if left_doc {
            Phase::Aligning
        } else {
            Phase::Ordering
        };

        let matched = match_slop <= u64::from(self.slop);
        if matched && self.collect_payloads {
            self.payload = self.candidates.iter_mut().flat_map(mem::take).collect();
        }
        matched
    }

    /// Starts every clause, by `next` or by skipping to `target`.
    fn start_clauses(&mut self, target: Option<DocId>) -> bool {
        for clause in &mut self.clauses {
            let more = match target {
                Some(target) => clause.skip_to(target),
                None => clause.next(),
            };
            if !more {
                self.phase = Phase::Exhausted;
                return false;
            }
        }
        self.phase = Phase::Aligning;
        true
    }
}

impl Spans for OrderedNearSpans {
    fn next(&mut self) -> bool {
        if self.phase == Phase::Unstarted && !self.start_clauses(None) {
            return false;
        }
        self.payload.clear();
        self.advance_after_ordered()
    }

    fn skip_to(&mut self, target: DocId) -> bool {
        match self.phase {
            Phase::Unstarted => {
                if !self.start_clauses(Some(target)) {
                    return false;
                }
            }
            Phase::Exhausted => return false,
            Phase::Aligning | Phase::Ordering => {
                if self.clauses[0].doc() < target {
                    if !self.clauses[0].skip_to(target) {
                        self.phase = Phase::Exhausted;
                        return false;
                    }
                    self.phase = Phase::Aligning;
                }
            }
        }
        self.payload.clear();
        self.advance_after_ordered()
    }

    fn doc(&self) -> DocId {
        self.match_doc
    }

    fn start(&self) -> u32 {
        self.match_start
    }

    fn end(&self) -> u32 {
        self.match_end
    }

    fn take_payload(&mut self) -> Vec<Payload> {
        mem::take(&mut self.payload)
    }

    fn is_payload_available(&self) -> bool {
        !self.payload.is_empty()
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::{MemorySegment, Token},
        postings::TermSource,
        spans::{Match, collect_matches},
        term::TermSpans,
    };

    fn term(segment: &MemorySegment, text: &str) -> Box<dyn Spans> {
        Box::new(TermSpans::new(segment.postings("body", text).unwrap().unwrap()))
    }

    fn near(texts: &[&str], words: &[&str], slop: u32) -> Vec<Match> {
        let segment = MemorySegment::from_texts("body", texts);
        let clauses = words.iter().map(|w| term(&segment, w)).collect();
        collect_matches(&mut OrderedNearSpans::new(clauses, slop, true).unwrap())
    }

    #[test]
    fn needs_two_clauses() {
        let segment = MemorySegment::from_texts("body", &["a"]);
        assert_eq!(
            OrderedNearSpans::new(vec![term(&segment, "a")], 0, true).err(),
            Some(SpanError::TooFewClauses { count: 1 })
        );
        assert!(OrderedNearSpans::new(Vec::new(), 0, true).is_err());
    }

    #[test]
    fn slop_counts_gaps_between_clauses() {
        let text = ["a b x x x c"];
        assert!(near(&text, &["a", "b", "c"], 0).is_empty());
        assert!(near(&text, &["a", "b", "c"], 2).is_empty());
        assert_eq!(near(&text, &["a", "b", "c"], 3), vec![Match::new(0, 0, 6)]);
    }

    #[test]
    fn order_is_required() {
        assert!(near(&["b a"], &["a", "b"], 5).is_empty());
        assert_eq!(near(&["a b"], &["a", "b"], 0), vec![Match::new(0, 0, 2)]);
    }

    #[test]
    fn earlier_clause_is_shrunk_towards_later_one() {
        // Both "a"s precede "b"; only the closest one makes the match.
        assert_eq!(
            near(&["a x a b"], &["a", "b"], 0),
            vec![Match::new(0, 2, 4)]
        );
    }

    #[test]
    fn consecutive_matches_in_one_document() {
        assert_eq!(
            near(&["a b a b"], &["a", "b"], 0),
            vec![Match::new(0, 0, 2), Match::new(0, 2, 4)]
        );
    }

    #[test]
    fn aligns_across_documents() {
        assert_eq!(
            near(&["a", "b", "x", "a b", "b a", "a x b"], &["a", "b"], 1),
            vec![Match::new(3, 0, 2), Match::new(5, 0, 3)]
        );
    }

    #[test]
    fn skip_to_jumps_over_earlier_matches() {
        let segment = MemorySegment::from_texts("body", &["a b", "a b", "x", "a b"]);
        let mut near =
            OrderedNearSpans::new(vec![term(&segment, "a"), term(&segment, "b")], 0, true)
                .unwrap();
        assert!(near.skip_to(1));
        assert_eq!(near.doc(), 1);
        assert!(near.skip_to(2));
        assert_eq!(near.doc(), 3);
        assert!(!near.next());
    }

    #[test]
    fn payloads_follow_clause_order() {
        let mut segment = MemorySegment::new();
        segment.add_tokens(
            0,
            "body",
            [
                Token::with_payload("a", b"first".to_vec()),
                Token::with_payload("a", b"second".to_vec()),
                Token::with_payload("b", b"third".to_vec()),
            ],
        );
        let clauses = vec![term(&segment, "a"), term(&segment, "b")];
        let mut near = OrderedNearSpans::new(clauses, 0, true).unwrap();
        assert!(near.next());
        assert!(near.is_payload_available());
        assert_eq!(near.take_payload(), vec![b"second".to_vec(), b"third".to_vec()]);
        assert!(!near.is_payload_available());

        let clauses = vec![term(&segment, "a"), term(&segment, "b")];
        let mut near = OrderedNearSpans::new(clauses, 0, false).unwrap();
        assert!(near.next());
        assert!(!near.is_payload_available());
    }

    #[test]
    fn cost_is_cheapest_clause() {
        let segment = MemorySegment::from_texts("body", &["a b", "a", "a"]);
        let near = OrderedNearSpans::new(vec![term(&segment, "a"), term(&segment, "b")], 0, true)
            .unwrap();
        assert_eq!(near.cost(), 1);
    }
}
