//! Index schema definition for the nearby index.
//!
//! - `id`: Caller-assigned document identifier (u64, indexed, stored, fast)
//! - `title`: Document title (text with positions, stored)
//! - `body`: Document content (text with positions, stored)
//! - `tags`: Document tags (text without positions, stored)
//!
//! Span queries need positions, so they run on `title` and `body` only.
//! A span query against `tags` fails instead of matching nothing.

use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, Schema, TextFieldIndexing, TextOptions,
};

use crate::analyzer::NEARBY_TOKENIZER;

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Caller-assigned document identifier.
    pub id: Field,
    /// Document title.
    pub title: Field,
    /// Document body.
    pub body: Field,
    /// Document tags.
    pub tags: Field,
}

impl IndexSchema {
    /// Creates a new index schema with all fields configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let id = builder.add_u64_field("id", INDEXED | STORED | FAST);

        let positional = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(NEARBY_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();
        let title = builder.add_text_field("title", positional.clone());
        let body = builder.add_text_field("body", positional);

        let tags_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(NEARBY_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqs),
            )
            .set_stored();
        let tags = builder.add_text_field("tags", tags_options);

        Self {
            schema: builder.build(),
            id,
            title,
            body,
            tags,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use tantivy::schema::FieldType;

    use super::*;

    /// Index option of a text field.
    fn index_option(schema: &IndexSchema, field: Field) -> IndexRecordOption {
        match schema.schema().get_field_entry(field).field_type() {
            FieldType::Str(opts) => opts.get_indexing_options().unwrap().index_option(),
            _ => panic!("expected a text field"),
        }
    }

    #[test]
    fn schema_has_all_fields() {
        let schema = IndexSchema::new();
        for name in ["id", "title", "body", "tags"] {
            assert!(schema.schema().get_field(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn id_is_u64_stored_and_fast() {
        let schema = IndexSchema::new();
        let entry = schema.schema().get_field_entry(schema.id);
        assert!(matches!(entry.field_type(), FieldType::U64(_)));
        assert!(entry.is_stored());
        assert!(entry.is_fast());
    }

    #[test]
    fn text_fields_record_positions() {
        let schema = IndexSchema::new();
        assert!(index_option(&schema, schema.title).has_positions());
        assert!(index_option(&schema, schema.body).has_positions());
        assert!(!index_option(&schema, schema.tags).has_positions());
    }
}
