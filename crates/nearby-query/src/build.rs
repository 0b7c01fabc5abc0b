//! Compiles a query tree into span iterators against one term source.

use nearby_spans::{
    EmptySpans, FilterSpans, NearPayloadCheck, NotSpans, OrSpans, OrderedNearSpans, PayloadCheck,
    PositionWindow, SpanError, Spans, TermSource, TermSpans, UnorderedNearSpans,
};
use tracing::debug;

use crate::ast::SpanQuery;

/// Builds the iterator for `query`.
pub fn spans(query: &SpanQuery, source: &dyn TermSource) -> Result<Box<dyn Spans>, SpanError> {
    let spans: Box<dyn Spans> = match query {
        SpanQuery::Term(term) => match source.postings(&term.field, &term.text)? {
            Some(postings) => Box::new(TermSpans::new(postings)),
            None => {
                debug!(field = %term.field, text = %term.text, "term absent from segment");
                Box::new(EmptySpans)
            }
        },
        SpanQuery::Or(clauses) if clauses.len() == 1 => spans(&clauses[0], source)?,
        SpanQuery::Or(clauses) => Box::new(OrSpans::new(all(clauses, source)?)),
        SpanQuery::Not {
            include,
            exclude,
            pre,
            post,
        } => Box::new(NotSpans::new(
            spans(include, source)?,
            spans(exclude, source)?,
            *pre,
            *post,
        )),
        SpanQuery::Near {
            clauses,
            slop,
            in_order: true,
            collect_payloads,
        } => Box::new(OrderedNearSpans::new(
            all(clauses, source)?,
            *slop,
            *collect_payloads,
        )?),
        SpanQuery::Near {
            clauses,
            slop,
            in_order: false,
            ..
        } => Box::new(UnorderedNearSpans::new(all(clauses, source)?, *slop)?),
        SpanQuery::First { inner, end } => Box::new(FilterSpans::new(
            spans(inner, source)?,
            PositionWindow::first(*end),
        )),
        SpanQuery::Range { inner, start, end } => Box::new(FilterSpans::new(
            spans(inner, source)?,
            PositionWindow::new(*start, *end),
        )),
        SpanQuery::PayloadCheck { inner, payloads } => Box::new(FilterSpans::new(
            spans(inner, source)?,
            PayloadCheck::new(payloads.clone()),
        )),
        SpanQuery::NearPayloadCheck { inner, payloads } => Box::new(FilterSpans::new(
            spans(inner, source)?,
            NearPayloadCheck::new(payloads.clone()),
        )),
    };
    Ok(spans)
}

/// Builds one iterator per clause.
fn all(clauses: &[SpanQuery], source: &dyn TermSource) -> Result<Vec<Box<dyn Spans>>, SpanError> {
    clauses.iter().map(|clause| spans(clause, source)).collect()
}

#[cfg(test)]
mod tests {
    use nearby_spans::{Match, MemorySegment, Token, collect_matches};

    use super::*;

    fn t(text: &str) -> SpanQuery {
        SpanQuery::term("body", text).unwrap()
    }

    fn run(query: &SpanQuery, segment: &MemorySegment) -> Vec<Match> {
        collect_matches(&mut spans(query, segment).unwrap())
    }

    #[test]
    fn absent_term_matches_nothing() {
        let segment = MemorySegment::from_texts("body", &["nine six"]);
        assert!(run(&t("seven"), &segment).is_empty());
        let near = SpanQuery::near(vec![t("nine"), t("seven")], 3, false).unwrap();
        assert!(run(&near, &segment).is_empty());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let segment = MemorySegment::from_texts("body", &["nine six"]);
        let query = SpanQuery::term("title", "nine").unwrap();
        assert_eq!(
            spans(&query, &segment).err(),
            Some(SpanError::UnknownField {
                field: "title".into()
            })
        );
    }

    #[test]
    fn field_without_positions_is_an_error() {
        let mut segment = MemorySegment::from_texts("body", &["nine six"]);
        segment.disable_positions("body");
        assert!(matches!(
            spans(&t("nine"), &segment),
            Err(SpanError::PositionsNotIndexed { .. })
        ));
    }

    #[test]
    fn single_clause_union_is_its_clause() {
        let segment = MemorySegment::from_texts("body", &["a b a"]);
        let or = SpanQuery::or(vec![t("a")]).unwrap();
        assert_eq!(run(&or, &segment), run(&t("a"), &segment));
    }

    #[test]
    fn composites_compile_to_their_iterators() {
        let segment = MemorySegment::from_texts("body", &["a b x x x c", "c b a"]);
        let near = SpanQuery::near(vec![t("a"), t("b"), t("c")], 3, true).unwrap();
        assert_eq!(run(&near, &segment), vec![Match::new(0, 0, 6)]);

        let unordered = SpanQuery::near(vec![t("a"), t("c")], 1, false).unwrap();
        assert_eq!(run(&unordered, &segment), vec![Match::new(1, 0, 3)]);

        let first = SpanQuery::first(t("c"), 1);
        assert_eq!(run(&first, &segment), vec![Match::new(1, 0, 1)]);

        let range = SpanQuery::range(t("b"), 1, 2).unwrap();
        assert_eq!(
            run(&range, &segment),
            vec![Match::new(0, 1, 2), Match::new(1, 1, 2)]
        );

        let not = SpanQuery::not(t("a"), t("b"), 0, 1).unwrap();
        assert_eq!(run(&not, &segment), vec![Match::new(1, 2, 3)]);
    }

    #[test]
    fn payload_filters() {
        let mut segment = MemorySegment::new();
        segment.add_tokens(
            0,
            "body",
            [
                Token::with_payload("a", b"p0".to_vec()),
                Token::with_payload("b", b"p1".to_vec()),
            ],
        );
        let near = || SpanQuery::near(vec![t("a"), t("b")], 0, true).unwrap();
        let exact = SpanQuery::payload_check(near(), vec![b"p0".to_vec(), b"p1".to_vec()]);
        assert_eq!(run(&exact, &segment), vec![Match::new(0, 0, 2)]);

        let swapped = SpanQuery::payload_check(near(), vec![b"p1".to_vec(), b"p0".to_vec()]);
        assert!(run(&swapped, &segment).is_empty());

        let any_order =
            SpanQuery::near_payload_check(near(), vec![b"p1".to_vec(), b"p0".to_vec()]);
        assert_eq!(run(&any_order, &segment), vec![Match::new(0, 0, 2)]);

        let uncollected = SpanQuery::payload_check(
            near().collect_payloads(false),
            vec![b"p0".to_vec(), b"p1".to_vec()],
        );
        assert!(run(&uncollected, &segment).is_empty());
    }
}
