//! An in-memory segment implementing the term-source contract.
//!
//! Useful for tests and for running span queries over small, transient
//! collections without an on-disk index.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::{
    error::SpanError,
    postings::{PositionStream, TermSource},
    spans::{DocId, Payload, TERMINATED},
};

/// One token to index, with an optional payload at its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Indexed term text, used verbatim.
    pub text: String,
    /// Bytes stored at the token's position.
    pub payload: Option<Payload>,
}

impl Token {
    /// A token without payload.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: None,
        }
    }

    /// A token carrying `payload` at its position.
    pub fn with_payload(text: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            text: text.into(),
            payload: Some(payload.into()),
        }
    }
}

/// Positions of one term in one document.
#[derive(Debug, Clone)]
struct DocPostings {
    /// Document id.
    doc: DocId,
    /// Increasing positions, each with its optional payload.
    positions: Vec<(u32, Option<Payload>)>,
}

/// Everything indexed for one field.
#[derive(Debug, Default)]
struct MemoryField {
    /// Whether positions were recorded for this field.
    with_positions: bool,
    /// Postings per term, sorted by document.
    terms: BTreeMap<String, Arc<Vec<DocPostings>>>,
    /// Next free position per document.
    lengths: HashMap<DocId, u32>,
}

impl MemoryField {
    /// A field that records positions.
    fn positional() -> Self {
        Self {
            with_positions: true,
            ..Self::default()
        }
    }

    /// Appends one token at the next free position of `doc`.
    fn push(&mut self, doc: DocId, token: Token) {
        let length = self.lengths.entry(doc).or_insert(0);
        let position = *length;
        *length += 1;

        let docs = Arc::make_mut(self.terms.entry(token.text).or_default());
        let slot = docs.partition_point(|p| p.doc < doc);
        if docs.get(slot).is_none_or(|p| p.doc != doc) {
            docs.insert(
                slot,
                DocPostings {
                    doc,
                    positions: Vec::new(),
                },
            );
        }
        docs[slot].positions.push((position, token.payload));
    }
}

/// A segment held entirely in memory.
///
/// Documents may be added in any order; each call appends tokens after the
/// ones already present in that document's field.
#[derive(Debug, Default)]
pub struct MemorySegment {
    /// Indexed fields by name.
    fields: HashMap<String, MemoryField>,
    /// One past the highest document id seen.
    num_docs: u32,
}

impl MemorySegment {
    /// Creates an empty segment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a segment where document `i` holds `texts[i]` in `field`.
    pub fn from_texts<S: AsRef<str>>(field: &str, texts: &[S]) -> Self {
        let mut segment = Self::new();
        for (doc, text) in (0..).zip(texts) {
            segment.add_text(doc, field, text.as_ref());
        }
        segment
    }

    /// Marks `field` as indexed without positions.
    ///
    /// Span queries against such a field fail instead of matching nothing.
    pub fn disable_positions(&mut self, field: &str) {
        self.fields.entry(field.to_string()).or_default().with_positions = false;
    }

    /// Indexes `text` in `field` of `doc`.
    ///
    /// Text is split into runs of alphanumeric characters, lowercased.
    pub fn add_text(&mut self, doc: DocId, field: &str, text: &str) {
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| Token::new(word.to_lowercase()));
        self.add_tokens(doc, field, tokens);
    }

    /// Indexes pre-analyzed tokens in `field` of `doc`.
    pub fn add_tokens(&mut self, doc: DocId, field: &str, tokens: impl IntoIterator<Item = Token>) {
        debug_assert!(doc < TERMINATED);
        self.num_docs = self.num_docs.max(doc + 1);
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(MemoryField::positional);
        for token in tokens {
            entry.push(doc, token);
        }
    }

    /// One past the highest document id added so far.
    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    /// Number of documents containing `text` in `field`.
    pub fn doc_freq(&self, field: &str, text: &str) -> usize {
        self.fields
            .get(field)
            .and_then(|f| f.terms.get(text))
            .map_or(0, |docs| docs.len())
    }
}

impl TermSource for MemorySegment {
    fn postings(
        &self,
        field: &str,
        text: &str,
    ) -> Result<Option<Box<dyn PositionStream>>, SpanError> {
        let Some(entry) = self.fields.get(field) else {
            return Err(SpanError::UnknownField {
                field: field.to_string(),
            });
        };
        if !entry.with_positions {
            return Err(SpanError::PositionsNotIndexed {
                field: field.to_string(),
            });
        }
        Ok(entry.terms.get(text).map(|docs| {
            Box::new(MemoryPostings::new(Arc::clone(docs))) as Box<dyn PositionStream>
        }))
    }
}

/// Position stream over one term of a [`MemorySegment`].
#[derive(Debug)]
pub struct MemoryPostings {
    /// Shared postings of the term.
    docs: Arc<Vec<DocPostings>>,
    /// Index of the current document, `None` before the first advance.
    current: Option<usize>,
    /// Positions already returned for the current document.
    read: usize,
}

impl MemoryPostings {
    /// Wraps shared postings in an unstarted stream.
    fn new(docs: Arc<Vec<DocPostings>>) -> Self {
        Self {
            docs,
            current: None,
            read: 0,
        }
    }

    /// Postings of the current document, if positioned on one.
    fn entry(&self) -> Option<&DocPostings> {
        self.current.and_then(|i| self.docs.get(i))
    }

    /// Moves to document slot `slot` and rewinds the position cursor.
    fn land(&mut self, slot: usize) -> DocId {
        self.current = Some(slot);
        self.read = 0;
        self.doc()
    }
}

impl PositionStream for MemoryPostings {
    fn next_doc(&mut self) -> DocId {
        let slot = self.current.map_or(0, |i| i + 1);
        self.land(slot)
    }

    fn advance(&mut self, target: DocId) -> DocId {
        if self.current.is_some() && self.doc() >= target {
            return self.doc();
        }
        let from = self.current.map_or(0, |i| i + 1).min(self.docs.len());
        let slot = from + self.docs[from..].partition_point(|p| p.doc < target);
        self.land(slot)
    }

    fn doc(&self) -> DocId {
        self.entry().map_or(TERMINATED, |p| p.doc)
    }

    fn freq(&self) -> u32 {
        self.entry()
            .map_or(0, |p| u32::try_from(p.positions.len()).unwrap_or(u32::MAX))
    }

    fn next_position(&mut self) -> u32 {
        let position = self
            .entry()
            .and_then(|p| p.positions.get(self.read))
            .map(|(position, _)| *position);
        debug_assert!(position.is_some(), "read past the last position");
        self.read += 1;
        position.unwrap_or(u32::MAX)
    }

    fn payload(&self) -> Option<&[u8]> {
        let index = self.read.checked_sub(1)?;
        self.entry()?.positions.get(index)?.1.as_deref()
    }

    fn cost(&self) -> u64 {
        self.docs.len() as u64
    }
}
