//! Error types for span query construction, parsing and definitions.

use std::{error::Error, fmt, io, path::PathBuf};

use thiserror::Error;
use toml::de;

/// A structurally invalid query tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidQuery {
    /// A composite was given too few children.
    #[error("{kind} needs at least {min} clause(s), got {count}")]
    TooFewClauses {
        /// Composite name, e.g. "near".
        kind: &'static str,
        /// Minimum number of clauses.
        min: usize,
        /// Number of clauses supplied.
        count: usize,
    },

    /// Children of one composite search different fields.
    #[error("clauses must search one field: expected '{expected}', found '{found}'")]
    FieldMismatch {
        /// Field of the first clause.
        expected: String,
        /// Field of the offending clause.
        found: String,
    },

    /// A term names no field.
    #[error("term '{text}' has an empty field name")]
    EmptyField {
        /// Term text.
        text: String,
    },

    /// A term has empty text.
    #[error("empty term in field '{field}'")]
    EmptyTerm {
        /// Field the term was meant for.
        field: String,
    },

    /// A position window ends before it starts.
    #[error("position window [{start}, {end}) ends before it starts")]
    InvertedWindow {
        /// Window start.
        start: u32,
        /// Window end.
        end: u32,
    },
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Error message.
    pub message: String,
    /// Byte position in input where error occurred.
    pub position: usize,
    /// The original input string.
    pub input: String,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }

    /// Formats the error with a caret under the offending position.
    pub fn format_with_context(&self) -> String {
        format!(
            "query syntax error: {}\n  {}\n  {}^",
            self.message,
            self.input,
            " ".repeat(self.position.min(self.input.len()))
        )
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_context())
    }
}

impl Error for LexError {}

/// Parse error with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Byte position of the offending token, `None` at end of input.
    pub position: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "at byte {}: {}", pos, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.message,
            position: Some(err.position),
        }
    }
}

/// A unified error type for query text.
///
/// Carries the original query string so `Display` can point at the
/// offending position.
#[derive(Debug, Clone)]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone)]
pub enum QueryErrorKind {
    /// Lexer error (tokenization failed).
    Lex {
        /// Error message.
        message: String,
        /// Byte position in input.
        position: usize,
    },
    /// Parser error (invalid syntax).
    Parse {
        /// Error message.
        message: String,
        /// Byte position in input (if available).
        position: Option<usize>,
    },
    /// Well-formed syntax describing an invalid query.
    Invalid {
        /// The structural problem.
        source: InvalidQuery,
        /// Byte position of the expression that failed to build.
        position: Option<usize>,
    },
}

impl QueryError {
    /// Creates a lex error.
    pub fn lex(message: impl Into<String>, position: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: message.into(),
                position,
            },
            query: Some(query.into()),
        }
    }

    /// Creates a parse error.
    pub fn parse(
        message: impl Into<String>,
        position: Option<usize>,
        query: Option<String>,
    ) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: message.into(),
                position,
            },
            query,
        }
    }

    /// Creates an error for a query that parsed but cannot be built.
    pub fn invalid(source: InvalidQuery, position: Option<usize>) -> Self {
        Self {
            kind: QueryErrorKind::Invalid { source, position },
            query: None,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> String {
        match &self.kind {
            QueryErrorKind::Lex { message, .. } | QueryErrorKind::Parse { message, .. } => {
                message.clone()
            }
            QueryErrorKind::Invalid { source, .. } => source.to_string(),
        }
    }

    /// Byte position the error points at, if known.
    pub fn position(&self) -> Option<usize> {
        match &self.kind {
            QueryErrorKind::Lex { position, .. } => Some(*position),
            QueryErrorKind::Parse { position, .. } | QueryErrorKind::Invalid { position, .. } => {
                *position
            }
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match &self.kind {
            QueryErrorKind::Lex { message, .. } if message.contains("unclosed quote") => {
                Some("Add a closing quote (\") to complete the phrase")
            }
            QueryErrorKind::Lex { message, .. } if message.contains("distance") => {
                Some("Distances count from 1: 1W means adjacent and in order")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("closing parenthesis") => {
                Some("Add a closing parenthesis ) to match the opening one")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("OR") => {
                Some("OR requires expressions on both sides, e.g., 'nine OR six'")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("NOT") => {
                Some("NOT requires expressions on both sides, e.g., 'nine NOT six'")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("distance operator") => {
                Some("Write 3W (ordered) or 3N (unordered) between two expressions, e.g., 'nine 3W six'")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("adjacent") => {
                Some("Join expressions with a distance operator, e.g., 'nine 2N six'")
            }
            QueryErrorKind::Invalid {
                source: InvalidQuery::FieldMismatch { .. },
                ..
            } => Some("Every clause of a union, exclusion or proximity must search one field"),
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match &self.kind {
            QueryErrorKind::Lex { .. } | QueryErrorKind::Parse { .. } => "query syntax error",
            QueryErrorKind::Invalid { .. } => "query error",
        };

        writeln!(f, "{}: {}", prefix, self.message())?;

        if let Some(query) = &self.query {
            writeln!(f, "  {}", query)?;
            if let Some(pos) = self.position() {
                let clamped = pos.min(query.len());
                writeln!(f, "  {}^", " ".repeat(clamped))?;
            }
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: err.message,
                position: err.position,
            },
            query: Some(err.input),
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: err.message,
                position: err.position,
            },
            query: None,
        }
    }
}

/// Errors raised while loading a TOML query definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Failed to read a definition file.
    #[error("failed to read query definition {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The definition is not valid TOML or has the wrong shape.
    #[error("failed to parse query definition: {0}")]
    ParseToml(#[from] de::Error),

    /// The definition describes an invalid query.
    #[error("invalid query definition: {0}")]
    Invalid(#[from] InvalidQuery),
}
