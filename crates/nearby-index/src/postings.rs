//! Adapts Tantivy segment postings to the span engine's term source.

use nearby_spans::{DocId, PositionStream, SpanError, TERMINATED, TermSource};
use tantivy::{
    DocSet, Postings, SegmentReader, Term,
    postings::SegmentPostings,
    schema::{FieldType, IndexRecordOption},
};
use tracing::trace;

/// Position stream over one term's postings in one segment.
///
/// Tantivy postings sit on their first document as soon as they are read,
/// while the span engine expects an unstarted stream. The first
/// `next_doc` therefore reports the current document instead of moving.
pub struct TantivyPositions {
    /// Underlying postings.
    postings: SegmentPostings,
    /// Whether the stream has been moved at least once.
    started: bool,
    /// Positions of the current document.
    positions: Vec<u32>,
    /// Index of the next position to hand out.
    next: usize,
}

impl TantivyPositions {
    /// Wraps freshly read postings.
    pub fn new(postings: SegmentPostings) -> Self {
        Self {
            postings,
            started: false,
            positions: Vec::new(),
            next: 0,
        }
    }

    /// Reads the positions of the current document.
    fn load(&mut self) -> DocId {
        let doc = self.postings.doc();
        self.positions.clear();
        self.next = 0;
        if doc != TERMINATED {
            self.postings.positions(&mut self.positions);
        }
        doc
    }
}

impl PositionStream for TantivyPositions {
    fn next_doc(&mut self) -> DocId {
        if self.started {
            if self.postings.doc() == TERMINATED {
                return TERMINATED;
            }
            self.postings.advance();
        } else {
            self.started = true;
        }
        self.load()
    }

    fn advance(&mut self, target: DocId) -> DocId {
        self.started = true;
        // seek requires forward movement
        if self.postings.doc() < target {
            self.postings.seek(target);
        }
        self.load()
    }

    fn doc(&self) -> DocId {
        self.postings.doc()
    }

    fn freq(&self) -> u32 {
        self.positions.len() as u32
    }

    fn next_position(&mut self) -> u32 {
        debug_assert!(self.next < self.positions.len(), "read past freq");
        let position = self.positions.get(self.next).copied().unwrap_or(TERMINATED);
        self.next += 1;
        position
    }

    fn payload(&self) -> Option<&[u8]> {
        None
    }

    fn cost(&self) -> u64 {
        u64::from(self.postings.size_hint())
    }
}

/// Term source reading postings from one Tantivy segment.
///
/// Term text is looked up as given; callers analyze it first.
pub struct SegmentTermSource<'a> {
    /// Segment being searched.
    reader: &'a SegmentReader,
}

impl<'a> SegmentTermSource<'a> {
    /// Creates a term source over `reader`.
    pub fn new(reader: &'a SegmentReader) -> Self {
        Self { reader }
    }
}

impl TermSource for SegmentTermSource<'_> {
    fn postings(
        &self,
        field: &str,
        text: &str,
    ) -> Result<Option<Box<dyn PositionStream>>, SpanError> {
        let schema = self.reader.schema();
        let handle = schema.get_field(field).map_err(|_| SpanError::UnknownField {
            field: field.to_string(),
        })?;
        let has_positions = match schema.get_field_entry(handle).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .is_some_and(|indexing| indexing.index_option().has_positions()),
            _ => false,
        };
        if !has_positions {
            return Err(SpanError::PositionsNotIndexed {
                field: field.to_string(),
            });
        }

        let term = Term::from_field_text(handle, text);
        let inverted_index = self
            .reader
            .inverted_index(handle)
            .map_err(|e| SpanError::index(&e))?;
        let postings = inverted_index
            .read_postings(&term, IndexRecordOption::WithFreqsAndPositions)
            .map_err(|e| SpanError::index(&e))?;
        trace!(field, text, found = postings.is_some(), "read postings");
        Ok(postings.map(|postings| {
            Box::new(TantivyPositions::new(postings)) as Box<dyn PositionStream>
        }))
    }
}
