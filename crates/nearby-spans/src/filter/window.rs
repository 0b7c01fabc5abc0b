//! Position window checks behind "first N" and range queries.

use super::{AcceptStatus, Candidate, PositionCheck};

/// Accepts matches lying entirely within `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionWindow {
    /// Lowest accepted start.
    start: u32,
    /// Highest accepted end.
    end: u32,
}

impl PositionWindow {
    /// Window `[start, end)`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Window covering the first `end` positions.
    pub fn first(end: u32) -> Self {
        Self::new(0, end)
    }
}

impl PositionCheck for PositionWindow {
    fn accept(&self, candidate: &mut Candidate<'_>) -> AcceptStatus {
        // Starts never decrease within a document, so nothing later can fit.
        if candidate.start() >= self.end {
            AcceptStatus::NoAndAdvance
        } else if candidate.start() >= self.start && candidate.end() <= self.end {
            AcceptStatus::Yes
        } else {
            AcceptStatus::No
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::FilterSpans,
        memory::MemorySegment,
        postings::TermSource,
        spans::{Match, Spans, collect_matches},
        term::TermSpans,
    };

    fn window(texts: &[&str], text: &str, check: PositionWindow) -> Vec<Match> {
        let segment = MemorySegment::from_texts("body", texts);
        let term = TermSpans::new(segment.postings("body", text).unwrap().unwrap());
        collect_matches(&mut FilterSpans::new(Box::new(term), check))
    }

    #[test]
    fn first_keeps_leading_positions() {
        assert_eq!(
            window(&["a b a", "b a"], "a", PositionWindow::first(1)),
            vec![Match::new(0, 0, 1)]
        );
    }

    #[test]
    fn range_keeps_inner_positions() {
        assert_eq!(
            window(&["a a a a", "x a"], "a", PositionWindow::new(1, 3)),
            vec![Match::new(0, 1, 2), Match::new(0, 2, 3), Match::new(1, 1, 2)]
        );
    }

    #[test]
    fn past_the_window_skips_to_next_document() {
        let segment = MemorySegment::from_texts("body", &["a b x x x c", "c"]);
        let mut c = FilterSpans::new(
            Box::new(TermSpans::new(segment.postings("body", "c").unwrap().unwrap())),
            PositionWindow::first(2),
        );
        assert!(c.next());
        assert_eq!(c.current(), Match::new(1, 0, 1));
    }

    #[test]
    fn empty_window_matches_nothing() {
        assert!(window(&["a a"], "a", PositionWindow::new(1, 1)).is_empty());
    }
}
