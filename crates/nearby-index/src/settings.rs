//! Index and search settings, read from TOML.

use std::{fs, path::Path};

use serde::Deserialize;
use tracing::debug;

use crate::{IndexError, analyzer::parse_language};

/// Smallest writer heap tantivy accepts per indexing thread.
const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

/// Settings shared by the writer and the searcher.
///
/// Every key is optional in TOML; missing keys take the defaults below.
///
/// ```toml
/// stemmer = "english"
/// writer_heap_bytes = 50000000
/// default_limit = 10
/// default_field = "body"
/// k1 = 1.2
/// b = 0.75
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Stemming language, or "none".
    pub stemmer: String,
    /// Heap size for the index writer, in bytes.
    pub writer_heap_bytes: usize,
    /// Maximum results when a search does not say.
    pub default_limit: usize,
    /// Field searched by terms without a field prefix.
    pub default_field: String,
    /// BM25 term-frequency saturation.
    pub k1: f32,
    /// BM25 length normalization.
    pub b: f32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            stemmer: String::from("english"),
            writer_heap_bytes: 50_000_000,
            default_limit: 10,
            default_field: String::from("body"),
            k1: 1.2,
            b: 0.75,
        }
    }
}

impl IndexSettings {
    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, IndexError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        debug!(
            stemmer = %settings.stemmer,
            default_field = %settings.default_field,
            k1 = settings.k1,
            b = settings.b,
            "index settings loaded"
        );
        Ok(settings)
    }

    /// Reads, parses and validates a settings file.
    pub fn from_file(path: &Path) -> Result<Self, IndexError> {
        let contents = fs::read_to_string(path).map_err(|source| IndexError::ReadSettings {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), IndexError> {
        parse_language(&self.stemmer)?;
        if self.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            return Err(IndexError::InvalidSettings(format!(
                "writer_heap_bytes must be at least {MIN_WRITER_HEAP_BYTES}, got {}",
                self.writer_heap_bytes
            )));
        }
        if self.default_limit == 0 {
            return Err(IndexError::InvalidSettings(
                "default_limit must be positive".to_string(),
            ));
        }
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(IndexError::InvalidSettings(format!(
                "k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(IndexError::InvalidSettings(format!(
                "b must be between 0 and 1, got {}",
                self.b
            )));
        }
        Ok(())
    }
}
