//! Index writer for adding documents to the Tantivy index.

use std::{fs, path::Path};

use serde::Deserialize;
use tantivy::{
    Index, IndexWriter as TantivyIndexWriter, TantivyDocument, Term, directory::MmapDirectory,
};
use tracing::debug;

use crate::{
    analyzer::register_analyzer, error::IndexError, schema::IndexSchema,
    settings::IndexSettings,
};

/// A document as handed to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndexDocument {
    /// Caller-assigned identifier, returned with search hits.
    pub id: u64,
    /// Title text.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Tags, indexed without positions.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl IndexDocument {
    /// Creates a document with a body and no title or tags.
    pub fn new(id: u64, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
            ..Self::default()
        }
    }
}

/// Writes documents to a Tantivy index.
///
/// The writer opens or creates an index and provides methods to add,
/// delete, and commit documents. Nothing is visible to searchers until
/// [`commit`](Self::commit).
pub struct IndexWriter {
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl IndexWriter {
    /// Opens or creates an index at the given path.
    pub fn open(path: &Path, settings: &IndexSettings) -> Result<Self, IndexError> {
        let schema = IndexSchema::new();

        fs::create_dir_all(path)?;

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;

        let index = Index::open_or_create(dir, schema.schema().clone())
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;
        debug!(path = %path.display(), "opened index for writing");

        Self::with_index(index, schema, settings)
    }

    /// Creates an empty index held in memory.
    pub fn in_memory(settings: &IndexSettings) -> Result<Self, IndexError> {
        let schema = IndexSchema::new();
        let index = Index::create_in_ram(schema.schema().clone());
        Self::with_index(index, schema, settings)
    }

    /// Wraps `index` in a single-threaded writer.
    fn with_index(
        index: Index,
        schema: IndexSchema,
        settings: &IndexSettings,
    ) -> Result<Self, IndexError> {
        register_analyzer(&index, &settings.stemmer)?;
        // One thread keeps document order stable inside a segment.
        let writer = index
            .writer_with_num_threads(1, settings.writer_heap_bytes)
            .map_err(|e| IndexError::write(&e))?;
        Ok(Self {
            index,
            writer,
            schema,
        })
    }

    /// Adds a document to the index.
    ///
    /// The document is staged for writing but not committed until
    /// [`commit`](Self::commit) is called.
    pub fn add_document(&mut self, doc: &IndexDocument) -> Result<(), IndexError> {
        let mut tantivy_doc = TantivyDocument::new();

        tantivy_doc.add_u64(self.schema.id, doc.id);
        tantivy_doc.add_text(self.schema.title, &doc.title);
        tantivy_doc.add_text(self.schema.body, &doc.body);

        // Tags go in as one string and are tokenized together
        tantivy_doc.add_text(self.schema.tags, doc.tags.join(" "));

        self.writer
            .add_document(tantivy_doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Adds multiple documents to the index.
    pub fn add_documents(&mut self, docs: &[IndexDocument]) -> Result<(), IndexError> {
        for doc in docs {
            self.add_document(doc)?;
        }
        debug!(count = docs.len(), "staged documents");
        Ok(())
    }

    /// Deletes every document with the given identifier.
    pub fn delete_by_id(&mut self, id: u64) {
        self.writer
            .delete_term(Term::from_field_u64(self.schema.id, id));
    }

    /// Commits all pending changes to the index.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        let opstamp = self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        debug!(opstamp, "index committed");
        Ok(())
    }

    /// Rolls back any uncommitted changes.
    pub fn rollback(&mut self) -> Result<(), IndexError> {
        self.writer.rollback().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Deletes all documents from the index.
    pub fn delete_all(&mut self) -> Result<(), IndexError> {
        self.writer
            .delete_all_documents()
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Number of committed documents.
    pub fn num_docs(&self) -> Result<u64, IndexError> {
        let reader = self.index.reader().map_err(|e| IndexError::search(&e))?;
        Ok(reader.searcher().num_docs())
    }

    /// The index being written.
    pub fn index(&self) -> &Index {
        &self.index
    }
}
