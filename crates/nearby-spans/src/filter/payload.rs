//! Payload equality checks.
//!
//! Both checks reject a match that carries no payload at all, whatever the
//! expected payloads are.

use super::{AcceptStatus, Candidate, PositionCheck};
use crate::spans::Payload;

/// Accepts matches whose payloads equal the expected ones, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCheck {
    /// Payloads to match, in position order.
    expected: Vec<Payload>,
}

impl PayloadCheck {
    /// Creates a check for exactly `expected`.
    pub fn new(expected: Vec<Payload>) -> Self {
        Self { expected }
    }
}

impl PositionCheck for PayloadCheck {
    fn accept(&self, candidate: &mut Candidate<'_>) -> AcceptStatus {
        if !candidate.has_payload() {
            return AcceptStatus::No;
        }
        if candidate.payload() == self.expected.as_slice() {
            AcceptStatus::Yes
        } else {
            AcceptStatus::No
        }
    }
}

/// Accepts matches whose payloads equal the expected ones in any order.
///
/// Meant for proximity matches, where the order of collected payloads is
/// not meaningful. Expected payloads form a multiset: each one can be
/// matched by a single candidate payload only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearPayloadCheck {
    /// Payloads to match, in any order.
    expected: Vec<Payload>,
}

impl NearPayloadCheck {
    /// Creates a check for `expected` in any order.
    pub fn new(expected: Vec<Payload>) -> Self {
        Self { expected }
    }
}

impl PositionCheck for NearPayloadCheck {
    fn accept(&self, candidate: &mut Candidate<'_>) -> AcceptStatus {
        if !candidate.has_payload() {
            return AcceptStatus::No;
        }
        let found = candidate.payload();
        if found.len() != self.expected.len() {
            return AcceptStatus::No;
        }
        let mut used = vec![false; self.expected.len()];
        for bytes in found {
            let slot = self
                .expected
                .iter()
                .zip(used.iter())
                .position(|(want, taken)| !taken && want == bytes);
            match slot {
                Some(i) => used[i] = true,
                None => return AcceptStatus::No,
            }
        }
        AcceptStatus::Yes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::FilterSpans,
        memory::{MemorySegment, Token},
        near::OrderedNearSpans,
        postings::TermSource,
        spans::{Match, Spans, collect_matches},
        term::TermSpans,
    };

    fn segment() -> MemorySegment {
        let mut segment = MemorySegment::new();
        segment.add_tokens(
            0,
            "body",
            [
                Token::with_payload("a", b"pos: 0".to_vec()),
                Token::with_payload("b", b"pos: 1".to_vec()),
                Token::new("c"),
            ],
        );
        segment.add_tokens(
            1,
            "body",
            [
                Token::with_payload("a", b"x".to_vec()),
                Token::with_payload("b", b"x".to_vec()),
            ],
        );
        segment
    }

    fn term(segment: &MemorySegment, text: &str) -> Box<dyn Spans> {
        Box::new(TermSpans::new(segment.postings("body", text).unwrap().unwrap()))
    }

    fn near_ab(segment: &MemorySegment) -> Box<dyn Spans> {
        Box::new(
            OrderedNearSpans::new(vec![term(segment, "a"), term(segment, "b")], 0, true).unwrap(),
        )
    }

    fn bytes(items: &[&str]) -> Vec<Payload> {
        items.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn exact_check_matches_term_payload() {
        let segment = segment();
        let mut spans = FilterSpans::new(term(&segment, "a"), PayloadCheck::new(bytes(&["pos: 0"])));
        assert!(spans.next());
        assert_eq!(spans.current(), Match::new(0, 0, 1));
        assert!(spans.is_payload_available());
        assert_eq!(spans.take_payload(), bytes(&["pos: 0"]));
        assert!(spans.take_payload().is_empty());
        assert!(!spans.next());
    }

    #[test]
    fn exact_check_respects_order() {
        let segment = segment();
        let ordered = collect_matches(&mut FilterSpans::new(
            near_ab(&segment),
            PayloadCheck::new(bytes(&["pos: 0", "pos: 1"])),
        ));
        assert_eq!(ordered, vec![Match::new(0, 0, 2)]);
        let reversed = collect_matches(&mut FilterSpans::new(
            near_ab(&segment),
            PayloadCheck::new(bytes(&["pos: 1", "pos: 0"])),
        ));
        assert!(reversed.is_empty());
    }

    #[test]
    fn near_check_ignores_order() {
        let segment = segment();
        let matches = collect_matches(&mut FilterSpans::new(
            near_ab(&segment),
            NearPayloadCheck::new(bytes(&["pos: 1", "pos: 0"])),
        ));
        assert_eq!(matches, vec![Match::new(0, 0, 2)]);
    }

    #[test]
    fn near_check_counts_duplicates() {
        let segment = segment();
        let twice = collect_matches(&mut FilterSpans::new(
            near_ab(&segment),
            NearPayloadCheck::new(bytes(&["x", "x"])),
        ));
        assert_eq!(twice, vec![Match::new(1, 0, 2)]);
        let mixed = collect_matches(&mut FilterSpans::new(
            near_ab(&segment),
            NearPayloadCheck::new(bytes(&["x", "pos: 0"])),
        ));
        assert!(mixed.is_empty());
    }

    #[test]
    fn missing_payload_is_rejected_by_both_checks() {
        let segment = segment();
        assert!(
            collect_matches(&mut FilterSpans::new(term(&segment, "c"), PayloadCheck::new(vec![])))
                .is_empty()
        );
        assert!(
            collect_matches(&mut FilterSpans::new(
                term(&segment, "c"),
                NearPayloadCheck::new(vec![])
            ))
            .is_empty()
        );
    }
}
