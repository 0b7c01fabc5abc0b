//! Search execution for the nearby index.
//!
//! Provides the [`Searcher`] struct for running span queries against the
//! index and retrieving results.

use std::path::Path;

use nearby_query::{SpanQuery, SpanTerm};
use tantivy::{
    DocAddress, Index, TantivyDocument,
    collector::{DocSetCollector, TopDocs},
    directory::MmapDirectory,
    query::{Explanation, Query},
    schema::Value,
    tokenizer::TextAnalyzer,
};
use tracing::debug;

use crate::{
    IndexError,
    analyzer::{analyze, build_analyzer_from_name, register_analyzer},
    query::SpanTantivyQuery,
    schema::IndexSchema,
    settings::IndexSettings,
    similarity::Bm25Params,
};

/// A search result from the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Caller-assigned document identifier.
    pub id: u64,
    /// Document title.
    pub title: String,
    /// BM25 score over the document's span matches.
    pub score: f32,
    /// Segment-local address, for [`Searcher::explain`].
    pub address: DocAddress,
}

/// Runs span queries against an index.
pub struct Searcher {
    /// The Tantivy index.
    index: Index,
    /// Schema with field handles.
    schema: IndexSchema,
    /// Analyzer applied to query terms, matching the indexed text.
    analyzer: TextAnalyzer,
    /// Search settings.
    settings: IndexSettings,
}

impl Searcher {
    /// Opens an existing index for searching.
    pub fn open(path: &Path, settings: &IndexSettings) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::OpenIndex {
                path: path.to_path_buf(),
                message: "index directory does not exist".to_string(),
            });
        }

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;
        let index = Index::open(dir).map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;
        debug!(path = %path.display(), "opened index for searching");

        Self::from_index(index, settings)
    }

    /// Searches an index that is already open, such as an in-memory one.
    ///
    /// Fails when the index was not built with [`IndexSchema`].
    pub fn from_index(index: Index, settings: &IndexSettings) -> Result<Self, IndexError> {
        settings.validate()?;
        let schema = IndexSchema::new();
        Self::check_schema(&index, &schema)?;
        register_analyzer(&index, &settings.stemmer)?;
        Ok(Self {
            index,
            schema,
            analyzer: build_analyzer_from_name(&settings.stemmer)?,
            settings: settings.clone(),
        })
    }

    /// Runs `text` through the index analyzer.
    pub fn analyze(&mut self, text: &str) -> Vec<String> {
        analyze(&mut self.analyzer, text)
    }

    /// Rewrites every term of `query` into its indexed form.
    ///
    /// A term the analyzer splits into several tokens becomes an exact
    /// phrase of those tokens.
    pub fn analyze_query(&mut self, query: SpanQuery) -> Result<SpanQuery, IndexError> {
        let analyzer = &mut self.analyzer;
        query.try_map_terms(&mut |term: SpanTerm| {
            let mut clauses = analyze(analyzer, &term.text)
                .into_iter()
                .map(|token| SpanQuery::term(term.field.clone(), token))
                .collect::<Result<Vec<_>, _>>()?;
            match clauses.len() {
                0 => Err(IndexError::EmptyTerm(term.text)),
                1 => Ok(clauses.remove(0)),
                _ => Ok(SpanQuery::near(clauses, 0, true)?),
            }
        })
    }

    /// Parses query text against the default field and analyzes its terms.
    ///
    /// Returns `None` for blank input.
    pub fn parse(&mut self, text: &str) -> Result<Option<SpanQuery>, IndexError> {
        let Some(query) = nearby_query::parse(text, &self.settings.default_field)? else {
            return Ok(None);
        };
        self.analyze_query(query).map(Some)
    }

    /// Returns the best `limit` documents for `query`, highest score first.
    ///
    /// Terms are looked up as given; see [`analyze_query`](Self::analyze_query).
    pub fn search(&self, query: &SpanQuery, limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = self.bind(query)?;
        let searcher = self.reader()?;
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| IndexError::search(&e))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(|e| IndexError::search(&e))?;
            hits.push(SearchHit {
                id: self.stored_id(&doc),
                title: doc
                    .get_first(self.schema.title)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                score,
                address,
            });
        }
        debug!(query = %query.span_query(), hits = hits.len(), "search finished");
        Ok(hits)
    }

    /// Parses, analyzes and runs query text, returning at most the
    /// configured default number of hits.
    pub fn search_text(&mut self, text: &str) -> Result<Vec<SearchHit>, IndexError> {
        match self.parse(text)? {
            Some(query) => self.search(&query, self.settings.default_limit),
            None => Ok(Vec::new()),
        }
    }

    /// Identifiers of every document matching `query`, in ascending order.
    pub fn matching_ids(&self, query: &SpanQuery) -> Result<Vec<u64>, IndexError> {
        let query = self.bind(query)?;
        let searcher = self.reader()?;
        let addresses = searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| IndexError::search(&e))?;
        let mut ids = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address).map_err(|e| IndexError::search(&e))?;
            ids.push(self.stored_id(&doc));
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Explains the score of the document at `address`.
    pub fn explain(
        &self,
        query: &SpanQuery,
        address: DocAddress,
    ) -> Result<Explanation, IndexError> {
        let query = self.bind(query)?;
        let searcher = self.reader()?;
        query
            .explain(&searcher, address)
            .map_err(|e| IndexError::search(&e))
    }

    /// Number of searchable documents.
    pub fn num_docs(&self) -> Result<u64, IndexError> {
        Ok(self.reader()?.num_docs())
    }

    /// Rejects an index whose fields differ from `expected`.
    fn check_schema(index: &Index, expected: &IndexSchema) -> Result<(), IndexError> {
        let actual = index.schema();
        if actual == *expected.schema() {
            return Ok(());
        }
        let differing: Vec<&str> = expected
            .schema()
            .fields()
            .filter(|(_, entry)| {
                actual
                    .get_field(entry.name())
                    .map(|field| actual.get_field_entry(field))
                    .ok()
                    != Some(*entry)
            })
            .map(|(_, entry)| entry.name())
            .collect();
        let message = if differing.is_empty() {
            "index has extra fields".to_string()
        } else {
            format!("fields differ: {}", differing.join(", "))
        };
        Err(IndexError::SchemaMismatch(message))
    }

    /// Binds `query` to the schema with the configured BM25 constants.
    fn bind(&self, query: &SpanQuery) -> Result<SpanTantivyQuery, IndexError> {
        let params = Bm25Params {
            k1: self.settings.k1,
            b: self.settings.b,
        };
        SpanTantivyQuery::new(query.clone(), self.schema.schema(), params)
    }

    /// A searcher over the latest commit.
    fn reader(&self) -> Result<tantivy::Searcher, IndexError> {
        let reader = self.index.reader().map_err(|e| IndexError::search(&e))?;
        Ok(reader.searcher())
    }

    /// Stored identifier of `doc`.
    fn stored_id(&self, doc: &TantivyDocument) -> u64 {
        doc.get_first(self.schema.id)
            .and_then(|v| v.as_u64())
            .unwrap_or_default()
    }
}
