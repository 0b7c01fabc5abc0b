//! Span queries for nearby search.
//!
//! A [`SpanQuery`] is a validated tree of positional operators that
//! compiles to a `nearby-spans` iterator against any term source. Queries
//! can be built in code, parsed from a surround-style text syntax, or read
//! from TOML definitions:
//!
//! - **Terms**: `nine` - every position of a word
//! - **Phrases**: `"nine hundred"` - exact ordered sequences
//! - **Ordered proximity**: `nine 5W six` - in order, at most 5 apart
//! - **Unordered proximity**: `nine 5N six` - any order, at most 5 apart
//! - **OR**: `nine OR six` - union of matches
//! - **NOT**: `nine 5W six NOT forty` - drop matches overlapping another query
//! - **Grouping**: `(a OR b) 2W c` - precedence control
//! - **Fields**: `title:(a 2W b)` - search a specific field
//!
//! # Example
//!
//! ```
//! use nearby_query::parse;
//! use nearby_spans::{MemorySegment, Spans};
//!
//! let segment = MemorySegment::from_texts("body", &["nine hundred six", "six nine"]);
//! let query = parse("nine 3W six", "body").unwrap().unwrap();
//! assert_eq!(query.to_string(), "near([body:nine, body:six], 2, ordered)");
//!
//! let mut spans = query.spans(&segment).unwrap();
//! assert!(spans.next());
//! assert_eq!((spans.doc(), spans.start(), spans.end()), (0, 0, 3));
//! assert!(!spans.next());
//! ```

#![warn(missing_docs)]

mod ast;
mod build;
mod definition;
mod error;
mod lexer;
mod parser;

pub use ast::{SpanQuery, SpanTerm};
pub use definition::{QueryDefinition, load_definition, parse_definition};
pub use error::{DefinitionError, InvalidQuery, LexError, ParseError, QueryError, QueryErrorKind};
pub use lexer::{Lexeme, Token, tokenize};
pub use parser::parse;
