//! BM25 over sloppy span frequencies.
//!
//! Tantivy's own BM25 weight takes an integer term frequency. Span matches
//! contribute `1 / (width + 1)` each, so the frequency is fractional and the
//! formula is evaluated here instead.

use nearby_spans::{DocId, SimScorer};
use tantivy::{
    Score, Term, fieldnorm::FieldNormReader, query::Bm25StatisticsProvider, schema::Field,
};

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length normalization.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Collection statistics a span query is scored against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Stats {
    /// Summed inverse document frequency of the query's terms.
    pub idf: f32,
    /// Average field length over the collection.
    pub avg_fieldnorm: f32,
}

impl Bm25Stats {
    /// Gathers statistics for `terms` in `field`.
    pub fn compute(
        provider: &dyn Bm25StatisticsProvider,
        field: Field,
        terms: &[Term],
    ) -> tantivy::Result<Self> {
        let total_docs = provider.total_num_docs()?;
        let total_tokens = provider.total_num_tokens(field)?;
        let avg_fieldnorm = if total_docs == 0 {
            1.0
        } else {
            total_tokens as f32 / total_docs as f32
        };
        let mut idf = 0.0;
        for term in terms {
            idf += idf_of(provider.doc_freq(term)?, total_docs);
        }
        Ok(Self { idf, avg_fieldnorm })
    }

    /// Statistics used when scoring is disabled.
    pub fn constant() -> Self {
        Self {
            idf: 1.0,
            avg_fieldnorm: 1.0,
        }
    }
}

/// Inverse document frequency of a term found in `doc_freq` of `total_docs`.
pub fn idf_of(doc_freq: u64, total_docs: u64) -> f32 {
    let doc_freq = doc_freq as f32;
    let total_docs = total_docs as f32;
    (1.0 + (total_docs - doc_freq + 0.5) / (doc_freq + 0.5)).ln()
}

/// Per-segment BM25 scorer over sloppy frequencies.
pub struct Bm25 {
    /// Boost times summed idf.
    weight: Score,
    /// Tuning constants.
    params: Bm25Params,
    /// Average field length.
    avg_fieldnorm: f32,
    /// Field lengths of this segment.
    fieldnorms: FieldNormReader,
}

impl Bm25 {
    /// Creates a scorer for one segment.
    pub fn new(
        stats: Bm25Stats,
        params: Bm25Params,
        boost: Score,
        fieldnorms: FieldNormReader,
    ) -> Self {
        Self {
            weight: boost * stats.idf,
            params,
            avg_fieldnorm: stats.avg_fieldnorm,
            fieldnorms,
        }
    }

    /// Length of the field in `doc`, in tokens.
    pub fn doc_len(&self, doc: DocId) -> u32 {
        self.fieldnorms.fieldnorm(doc)
    }

    /// Score for `freq` in a field of `doc_len` tokens.
    pub fn score_len(&self, doc_len: u32, freq: f32) -> Score {
        let Bm25Params { k1, b } = self.params;
        let norm = k1 * (1.0 - b + b * doc_len as f32 / self.avg_fieldnorm);
        self.weight * freq * (k1 + 1.0) / (freq + norm)
    }
}

impl SimScorer for Bm25 {
    fn slop_factor(&self, distance: u32) -> f32 {
        1.0 / (distance as f32 + 1.0)
    }

    fn score(&self, doc: DocId, freq: f32) -> f32 {
        self.score_len(self.doc_len(doc), freq)
    }
}
