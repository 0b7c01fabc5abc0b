//! Tantivy integration for nearby span queries.
//!
//! This crate runs `nearby-query` span queries against a Tantivy index.
//! It handles:
//! - Index creation and writing with a positional schema
//! - Text analysis with configurable stemming, shared by documents and queries
//! - Adapting Tantivy postings to the span engine's term source
//! - Ranking span matches with BM25 over their sloppy frequency
//! - Settings loaded from TOML
//!
//! # Example
//!
//! ```no_run
//! use nearby_index::{IndexDocument, IndexSettings, IndexWriter, Searcher};
//!
//! let settings = IndexSettings::default();
//! let mut writer = IndexWriter::open("./index".as_ref(), &settings).unwrap();
//! writer
//!     .add_document(&IndexDocument::new(1, "nine hundred and six"))
//!     .unwrap();
//! writer.commit().unwrap();
//!
//! let mut searcher = Searcher::open("./index".as_ref(), &settings).unwrap();
//! for hit in searcher.search_text("nine 5W six").unwrap() {
//!     println!("{} {:.3}", hit.id, hit.score);
//! }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod error;
mod postings;
mod query;
mod schema;
mod searcher;
mod settings;
mod similarity;
mod writer;

pub use analyzer::{
    NEARBY_TOKENIZER, NO_STEMMER, analyze, build_analyzer, build_analyzer_from_name,
    parse_language, register_analyzer,
};
pub use error::IndexError;
pub use postings::{SegmentTermSource, TantivyPositions};
pub use query::SpanTantivyQuery;
pub use schema::IndexSchema;
pub use searcher::{SearchHit, Searcher};
pub use settings::IndexSettings;
pub use similarity::{Bm25, Bm25Params, Bm25Stats, idf_of};
pub use writer::{IndexDocument, IndexWriter};
