//! Span query tree.
//!
//! A [`SpanQuery`] mirrors the composite iterators of `nearby-spans` one
//! variant per composite. The constructors validate the tree so a query
//! that exists can always be compiled; only the term source can still
//! refuse it (unknown field, no positions).

use std::{collections::BTreeSet, fmt};

use nearby_spans::{Payload, SpanError, Spans, TermSource};
use tracing::debug;

use crate::{build, error::InvalidQuery};

/// One term of one field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanTerm {
    /// Field name.
    pub field: String,
    /// Indexed term text.
    pub text: String,
}

impl SpanTerm {
    /// Creates a term.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for SpanTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// A positional query over a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanQuery {
    /// Every position of one term.
    Term(SpanTerm),

    /// Matches of any clause.
    Or(Vec<Self>),

    /// Matches of `include` with no `exclude` match within the tolerances.
    Not {
        /// Query whose matches are kept.
        include: Box<Self>,
        /// Query whose matches veto nearby `include` matches.
        exclude: Box<Self>,
        /// Positions before an include match that must be clear.
        pre: i32,
        /// Positions after an include match that must be clear.
        post: i32,
    },

    /// One match of every clause, within `slop` positions of each other.
    Near {
        /// Sub-queries, in required order when `in_order`.
        clauses: Vec<Self>,
        /// Maximum number of unmatched positions inside a match.
        slop: u32,
        /// Whether clauses must match in the given order.
        in_order: bool,
        /// Whether ordered matches gather their clauses' payloads.
        collect_payloads: bool,
    },

    /// Matches of `inner` ending at or before `end`.
    First {
        /// Filtered query.
        inner: Box<Self>,
        /// Exclusive end bound.
        end: u32,
    },

    /// Matches of `inner` inside `[start, end)`.
    Range {
        /// Filtered query.
        inner: Box<Self>,
        /// Inclusive start bound.
        start: u32,
        /// Exclusive end bound.
        end: u32,
    },

    /// Matches of `inner` whose payloads equal `payloads`, in order.
    PayloadCheck {
        /// Filtered query.
        inner: Box<Self>,
        /// Expected payloads.
        payloads: Vec<Payload>,
    },

    /// Matches of `inner` whose payloads equal `payloads` in any order.
    NearPayloadCheck {
        /// Filtered query.
        inner: Box<Self>,
        /// Expected payloads.
        payloads: Vec<Payload>,
    },
}

impl SpanQuery {
    /// A single term.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Result<Self, InvalidQuery> {
        let term = SpanTerm::new(field, text);
        if term.field.is_empty() {
            return Err(InvalidQuery::EmptyField { text: term.text });
        }
        if term.text.is_empty() {
            return Err(InvalidQuery::EmptyTerm { field: term.field });
        }
        Ok(Self::Term(term))
    }

    /// A union of one or more clauses over one field.
    pub fn or(clauses: Vec<Self>) -> Result<Self, InvalidQuery> {
        Self::check_clauses("or", 1, &clauses)?;
        Ok(Self::Or(clauses))
    }

    /// An exclusion. Negative tolerances are clamped to zero.
    pub fn not(include: Self, exclude: Self, pre: i32, post: i32) -> Result<Self, InvalidQuery> {
        Self::check_field(include.field(), &exclude)?;
        Ok(Self::Not {
            include: Box::new(include),
            exclude: Box::new(exclude),
            pre: pre.max(0),
            post: post.max(0),
        })
    }

    /// A proximity query of two or more clauses over one field.
    ///
    /// Payload collection is on; see [`collect_payloads`](Self::collect_payloads).
    pub fn near(clauses: Vec<Self>, slop: u32, in_order: bool) -> Result<Self, InvalidQuery> {
        Self::check_clauses("near", 2, &clauses)?;
        Ok(Self::Near {
            clauses,
            slop,
            in_order,
            collect_payloads: true,
        })
    }

    /// Sets payload collection on a proximity query; other queries are
    /// returned unchanged.
    #[must_use]
    pub fn collect_payloads(self, collect: bool) -> Self {
        match self {
            Self::Near {
                clauses,
                slop,
                in_order,
                ..
            } => Self::Near {
                clauses,
                slop,
                in_order,
                collect_payloads: collect,
            },
            other => other,
        }
    }

    /// Keeps matches of `inner` ending at or before `end`.
    pub fn first(inner: Self, end: u32) -> Self {
        Self::First {
            inner: Box::new(inner),
            end,
        }
    }

    /// Keeps matches of `inner` inside `[start, end)`.
    pub fn range(inner: Self, start: u32, end: u32) -> Result<Self, InvalidQuery> {
        if start > end {
            return Err(InvalidQuery::InvertedWindow { start, end });
        }
        Ok(Self::Range {
            inner: Box::new(inner),
            start,
            end,
        })
    }

    /// Keeps matches of `inner` carrying exactly `payloads`, in order.
    pub fn payload_check(inner: Self, payloads: Vec<Payload>) -> Self {
        Self::PayloadCheck {
            inner: Box::new(inner),
            payloads,
        }
    }

    /// Keeps matches of `inner` carrying `payloads` in any order.
    pub fn near_payload_check(inner: Self, payloads: Vec<Payload>) -> Self {
        Self::NearPayloadCheck {
            inner: Box::new(inner),
            payloads,
        }
    }

    /// The field every term of this query searches.
    pub fn field(&self) -> &str {
        match self {
            Self::Term(term) => &term.field,
            Self::Or(clauses) | Self::Near { clauses, .. } => {
                clauses.first().map_or("", Self::field)
            }
            Self::Not { include: inner, .. }
            | Self::First { inner, .. }
            | Self::Range { inner, .. }
            | Self::PayloadCheck { inner, .. }
            | Self::NearPayloadCheck { inner, .. } => inner.field(),
        }
    }

    /// Terms whose postings can contribute matches.
    ///
    /// The excluded side of a [`Not`](Self::Not) never produces matches and
    /// is left out.
    pub fn extract_terms(&self) -> BTreeSet<&SpanTerm> {
        let mut terms = BTreeSet::new();
        self.collect_terms(&mut terms);
        terms
    }

    /// Rebuilds this query with every term replaced by `f(term)`.
    ///
    /// The excluded side of a [`Not`](Self::Not) is mapped too. Replacements
    /// are expected to search the same field as the term they replace.
    pub fn try_map_terms<E, F>(self, f: &mut F) -> Result<Self, E>
    where
        F: FnMut(SpanTerm) -> Result<Self, E>,
    {
        let mapped = match self {
            Self::Term(term) => return f(term),
            Self::Or(clauses) => Self::Or(Self::try_map_all(clauses, f)?),
            Self::Not {
                include,
                exclude,
                pre,
                post,
            } => Self::Not {
                include: Box::new(include.try_map_terms(f)?),
                exclude: Box::new(exclude.try_map_terms(f)?),
                pre,
                post,
            },
            Self::Near {
                clauses,
                slop,
                in_order,
                collect_payloads,
            } => Self::Near {
                clauses: Self::try_map_all(clauses, f)?,
                slop,
                in_order,
                collect_payloads,
            },
            Self::First { inner, end } => Self::First {
                inner: Box::new(inner.try_map_terms(f)?),
                end,
            },
            Self::Range { inner, start, end } => Self::Range {
                inner: Box::new(inner.try_map_terms(f)?),
                start,
                end,
            },
            Self::PayloadCheck { inner, payloads } => Self::PayloadCheck {
                inner: Box::new(inner.try_map_terms(f)?),
                payloads,
            },
            Self::NearPayloadCheck { inner, payloads } => Self::NearPayloadCheck {
                inner: Box::new(inner.try_map_terms(f)?),
                payloads,
            },
        };
        Ok(mapped)
    }

    /// Compiles this query into a span iterator over one segment.
    ///
    /// Terms missing from the segment become empty iterators.
    pub fn spans(&self, source: &dyn TermSource) -> Result<Box<dyn Spans>, SpanError> {
        debug!(query = %self, "compiling span query");
        build::spans(self, source)
    }

    /// Maps the terms of every clause.
    fn try_map_all<E, F>(clauses: Vec<Self>, f: &mut F) -> Result<Vec<Self>, E>
    where
        F: FnMut(SpanTerm) -> Result<Self, E>,
    {
        clauses
            .into_iter()
            .map(|clause| clause.try_map_terms(f))
            .collect()
    }

    /// Adds the contributing terms of this query to `terms`.
    fn collect_terms<'a>(&'a self, terms: &mut BTreeSet<&'a SpanTerm>) {
        match self {
            Self::Term(term) => {
                terms.insert(term);
            }
            Self::Or(clauses) | Self::Near { clauses, .. } => {
                for clause in clauses {
                    clause.collect_terms(terms);
                }
            }
            Self::Not { include: inner, .. }
            | Self::First { inner, .. }
            | Self::Range { inner, .. }
            | Self::PayloadCheck { inner, .. }
            | Self::NearPayloadCheck { inner, .. } => inner.collect_terms(terms),
        }
    }

    /// Checks the clause count and that all clauses share one field.
    fn check_clauses(kind: &'static str, min: usize, clauses: &[Self]) -> Result<(), InvalidQuery> {
        if clauses.len() < min {
            return Err(InvalidQuery::TooFewClauses {
                kind,
                min,
                count: clauses.len(),
            });
        }
        if let Some((first, rest)) = clauses.split_first() {
            for clause in rest {
                Self::check_field(first.field(), clause)?;
            }
        }
        Ok(())
    }

    /// Checks that `other` searches `field`.
    fn check_field(field: &str, other: &Self) -> Result<(), InvalidQuery> {
        if other.field() == field {
            Ok(())
        } else {
            Err(InvalidQuery::FieldMismatch {
                expected: field.to_string(),
                found: other.field().to_string(),
            })
        }
    }
}

/// Writes `items` as a bracketed, comma-separated list.
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

/// Payload rendered as lossy UTF-8 in quotes.
struct ShowPayload<'a>(&'a [u8]);

impl fmt::Display for ShowPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.0))
    }
}

impl fmt::Display for SpanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{term}"),
            Self::Or(clauses) => {
                write!(f, "or(")?;
                write_list(f, clauses)?;
                write!(f, ")")
            }
            Self::Not {
                include,
                exclude,
                pre,
                post,
            } => write!(f, "not({include}, {exclude}, {pre}, {post})"),
            Self::Near {
                clauses,
                slop,
                in_order,
                ..
            } => {
                write!(f, "near(")?;
                write_list(f, clauses)?;
                let order = if *in_order { "ordered" } else { "unordered" };
                write!(f, ", {slop}, {order})")
            }
            Self::First { inner, end } => write!(f, "first({inner}, {end})"),
            Self::Range { inner, start, end } => write!(f, "range({inner}, {start}, {end})"),
            Self::PayloadCheck { inner, payloads } | Self::NearPayloadCheck { inner, payloads } => {
                let name = if matches!(self, Self::PayloadCheck { .. }) {
                    "payload"
                } else {
                    "near_payload"
                };
                let shown: Vec<ShowPayload<'_>> =
                    payloads.iter().map(|p| ShowPayload(p)).collect();
                write!(f, "{name}({inner}, ")?;
                write_list(f, &shown)?;
                write!(f, ")")
            }
        }
    }
}
