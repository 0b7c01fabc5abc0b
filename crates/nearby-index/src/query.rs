//! Runs span queries as Tantivy queries.
//!
//! [`SpanTantivyQuery`] gathers BM25 statistics once per search and builds
//! one span iterator per segment. Documents are ranked by BM25 over the
//! sloppy frequency of their matches, so tighter matches rank higher.

use nearby_query::SpanQuery;
use nearby_spans::{SpanError, SpanScorer, Spans};
use tantivy::{
    DocId, DocSet, Score, SegmentReader, TantivyError, Term,
    query::{EnableScoring, Explanation, Query, Scorer, Weight},
    schema::{Field, FieldType, Schema},
};
use tracing::debug;

use crate::{
    IndexError,
    postings::SegmentTermSource,
    similarity::{Bm25, Bm25Params, Bm25Stats},
};

/// A span query bound to a schema.
#[derive(Debug, Clone)]
pub struct SpanTantivyQuery {
    /// Query to run.
    query: SpanQuery,
    /// Field the query searches.
    field: Field,
    /// Contributing terms, for statistics.
    terms: Vec<Term>,
    /// BM25 constants.
    params: Bm25Params,
}

impl SpanTantivyQuery {
    /// Binds `query` to `schema`.
    ///
    /// Fails when the query's field is missing or was indexed without
    /// positions.
    pub fn new(
        query: SpanQuery,
        schema: &Schema,
        params: Bm25Params,
    ) -> Result<Self, IndexError> {
        let name = query.field();
        let field = schema
            .get_field(name)
            .map_err(|_| IndexError::UnknownField(name.to_string()))?;
        let has_positions = match schema.get_field_entry(field).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .is_some_and(|indexing| indexing.index_option().has_positions()),
            _ => false,
        };
        if !has_positions {
            return Err(SpanError::PositionsNotIndexed {
                field: name.to_string(),
            }
            .into());
        }
        let terms = query
            .extract_terms()
            .into_iter()
            .map(|term| Term::from_field_text(field, &term.text))
            .collect();
        Ok(Self {
            query,
            field,
            terms,
            params,
        })
    }

    /// The wrapped span query.
    pub fn span_query(&self) -> &SpanQuery {
        &self.query
    }
}

impl Query for SpanTantivyQuery {
    fn weight(&self, enable_scoring: EnableScoring<'_>) -> tantivy::Result<Box<dyn Weight>> {
        let stats = match enable_scoring {
            EnableScoring::Enabled {
                statistics_provider,
                ..
            } => Bm25Stats::compute(statistics_provider, self.field, &self.terms)?,
            EnableScoring::Disabled { .. } => Bm25Stats::constant(),
        };
        debug!(
            query = %self.query,
            idf = stats.idf,
            avg_fieldnorm = stats.avg_fieldnorm,
            "created span weight"
        );
        Ok(Box::new(SpanWeight {
            query: self.query.clone(),
            field: self.field,
            stats,
            params: self.params,
        }))
    }

    fn query_terms<'a>(&'a self, visitor: &mut dyn FnMut(&'a Term, bool)) {
        for term in &self.terms {
            visitor(term, true);
        }
    }
}

/// Per-search state of a [`SpanTantivyQuery`].
struct SpanWeight {
    /// Query to run.
    query: SpanQuery,
    /// Field the query searches.
    field: Field,
    /// Collection statistics.
    stats: Bm25Stats,
    /// BM25 constants.
    params: Bm25Params,
}

impl SpanWeight {
    /// Builds the document scorer for one segment.
    fn doc_scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<SpanDocScorer> {
        let source = SegmentTermSource::new(reader);
        let spans = self
            .query
            .spans(&source)
            .map_err(|e| TantivyError::InvalidArgument(e.to_string()))?;
        let fieldnorms = reader.get_fieldnorms_reader(self.field)?;
        let sim = Bm25::new(self.stats, self.params, boost, fieldnorms);
        Ok(SpanDocScorer::new(SpanScorer::new(spans, sim)))
    }
}

impl Weight for SpanWeight {
    fn scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<Box<dyn Scorer>> {
        Ok(Box::new(self.doc_scorer(reader, boost)?))
    }

    fn explain(&self, reader: &SegmentReader, doc: DocId) -> tantivy::Result<Explanation> {
        let mut scorer = self.doc_scorer(reader, 1.0)?;
        if scorer.seek(doc) != doc {
            return Err(TantivyError::InvalidArgument(format!(
                "Document #({doc}) does not match"
            )));
        }
        let doc_len = reader.get_fieldnorms_reader(self.field)?.fieldnorm(doc);

        let mut explanation =
            Explanation::new("span query, BM25 over sloppy frequency", scorer.score());
        explanation.add_detail(Explanation::new(
            "freq, summed 1 / (width + 1) of matches",
            scorer.inner.sloppy_freq(),
        ));
        explanation.add_detail(Explanation::new_with_string(
            format!("matches in document: {}", scorer.inner.freq()),
            scorer.inner.freq() as Score,
        ));
        explanation.add_detail(Explanation::new(
            "idf, summed over query terms",
            self.stats.idf,
        ));
        explanation.add_detail(Explanation::new("dl, length of field", doc_len as Score));
        explanation.add_detail(Explanation::new(
            "avgdl, average length of field",
            self.stats.avg_fieldnorm,
        ));
        Ok(explanation)
    }
}

/// Tantivy scorer over span matches.
///
/// Tantivy expects a scorer to sit on its first document when created.
struct SpanDocScorer {
    /// Span scorer positioned on the current document.
    inner: SpanScorer<Box<dyn Spans>, Bm25>,
}

impl SpanDocScorer {
    /// Wraps `inner` and moves it to its first document.
    fn new(mut inner: SpanScorer<Box<dyn Spans>, Bm25>) -> Self {
        inner.next_doc();
        Self { inner }
    }
}

impl DocSet for SpanDocScorer {
    fn advance(&mut self) -> DocId {
        self.inner.next_doc()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.inner.doc() >= target {
            return self.inner.doc();
        }
        self.inner.advance(target)
    }

    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn size_hint(&self) -> u32 {
        u32::try_from(self.inner.cost()).unwrap_or(u32::MAX)
    }
}

impl Scorer for SpanDocScorer {
    fn score(&mut self) -> Score {
        self.inner.score()
    }
}
