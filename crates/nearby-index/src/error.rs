//! Error types for the nearby-index crate.

use std::{io, path::PathBuf};

use nearby_query::{InvalidQuery, QueryError};
use nearby_spans::SpanError;
use thiserror::Error;
use toml::de;

/// Errors that can occur when working with the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// Failed to run a search.
    #[error("search failed: {0}")]
    Search(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),

    /// The index was built with a different schema.
    #[error("index schema does not match: {0}")]
    SchemaMismatch(String),

    /// A query names a field the schema does not have.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A query term produced no tokens after analysis.
    #[error("term '{0}' contains nothing searchable")]
    EmptyTerm(String),

    /// Failed to read a settings file.
    #[error("failed to read settings file {path}: {source}")]
    ReadSettings {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Settings are not valid TOML or have the wrong shape.
    #[error("failed to parse settings: {0}")]
    ParseSettings(#[from] de::Error),

    /// Settings parsed but hold unusable values.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Query text failed to parse.
    #[error("{0}")]
    Query(#[from] QueryError),

    /// A span query cannot run against the index.
    #[error("{0}")]
    Span(#[from] SpanError),

    /// A query tree is structurally invalid.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] InvalidQuery),
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Search` error from a Tantivy error.
    pub(crate) fn search(source: &tantivy::TantivyError) -> Self {
        Self::Search(source.to_string())
    }
}
