//! TOML query definitions.
//!
//! A definition is a tree of tables tagged by `type`:
//!
//! ```toml
//! type = "not"
//!
//! [include]
//! type = "near"
//! slop = 4
//! clauses = [
//!     { type = "term", text = "nine" },
//!     { type = "term", text = "six" },
//! ]
//!
//! [exclude]
//! type = "term"
//! text = "forty"
//! ```
//!
//! Terms without a `field` search the caller's default field. Payloads are
//! written as UTF-8 strings.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    ast::SpanQuery,
    error::{DefinitionError, InvalidQuery},
};

/// Returns true, for serde defaults.
fn yes() -> bool {
    true
}

/// Raw shape of a query definition, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryDefinition {
    /// A single term.
    Term {
        /// Field to search; the default field when absent.
        #[serde(default)]
        field: Option<String>,
        /// Term text.
        text: String,
    },
    /// A union.
    Or {
        /// Alternatives.
        clauses: Vec<QueryDefinition>,
    },
    /// An exclusion.
    Not {
        /// Query whose matches are kept.
        include: Box<QueryDefinition>,
        /// Query whose matches veto nearby include matches.
        exclude: Box<QueryDefinition>,
        /// Positions before an include match that must be clear.
        #[serde(default)]
        pre: i32,
        /// Positions after an include match that must be clear.
        #[serde(default)]
        post: i32,
    },
    /// A proximity query.
    Near {
        /// Sub-queries.
        clauses: Vec<QueryDefinition>,
        /// Maximum number of unmatched positions inside a match.
        #[serde(default)]
        slop: u32,
        /// Whether clauses must match in order.
        #[serde(default = "yes")]
        in_order: bool,
        /// Whether ordered matches gather payloads.
        #[serde(default = "yes")]
        collect_payloads: bool,
    },
    /// Matches ending at or before `end`.
    First {
        /// Filtered query.
        inner: Box<QueryDefinition>,
        /// Exclusive end bound.
        end: u32,
    },
    /// Matches inside `[start, end)`.
    Range {
        /// Filtered query.
        inner: Box<QueryDefinition>,
        /// Inclusive start bound.
        start: u32,
        /// Exclusive end bound.
        end: u32,
    },
    /// Matches carrying exactly these payloads, in order.
    Payload {
        /// Filtered query.
        inner: Box<QueryDefinition>,
        /// Expected payloads.
        payloads: Vec<String>,
    },
    /// Matches carrying these payloads in any order.
    NearPayload {
        /// Filtered query.
        inner: Box<QueryDefinition>,
        /// Expected payloads.
        payloads: Vec<String>,
    },
}

impl QueryDefinition {
    /// Parses a definition from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses a definition file.
    pub fn from_file(path: &Path) -> Result<Self, DefinitionError> {
        let contents = fs::read_to_string(path).map_err(|source| DefinitionError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validates the definition into a query.
    pub fn into_query(self, default_field: &str) -> Result<SpanQuery, InvalidQuery> {
        let all = |clauses: Vec<Self>| -> Result<Vec<SpanQuery>, InvalidQuery> {
            clauses
                .into_iter()
                .map(|clause| clause.into_query(default_field))
                .collect()
        };
        let bytes = |payloads: Vec<String>| -> Vec<Vec<u8>> {
            payloads.into_iter().map(String::into_bytes).collect()
        };

        match self {
            Self::Term { field, text } => {
                SpanQuery::term(field.as_deref().unwrap_or(default_field), text)
            }
            Self::Or { clauses } => SpanQuery::or(all(clauses)?),
            Self::Not {
                include,
                exclude,
                pre,
                post,
            } => SpanQuery::not(
                include.into_query(default_field)?,
                exclude.into_query(default_field)?,
                pre,
                post,
            ),
            Self::Near {
                clauses,
                slop,
                in_order,
                collect_payloads,
            } => Ok(SpanQuery::near(all(clauses)?, slop, in_order)?
                .collect_payloads(collect_payloads)),
            Self::First { inner, end } => Ok(SpanQuery::first(inner.into_query(default_field)?, end)),
            Self::Range { inner, start, end } => {
                SpanQuery::range(inner.into_query(default_field)?, start, end)
            }
            Self::Payload { inner, payloads } => Ok(SpanQuery::payload_check(
                inner.into_query(default_field)?,
                bytes(payloads),
            )),
            Self::NearPayload { inner, payloads } => Ok(SpanQuery::near_payload_check(
                inner.into_query(default_field)?,
                bytes(payloads),
            )),
        }
    }
}

/// Parses and validates a TOML definition in one step.
pub fn parse_definition(contents: &str, default_field: &str) -> Result<SpanQuery, DefinitionError> {
    Ok(QueryDefinition::from_toml_str(contents)?.into_query(default_field)?)
}

/// Reads, parses and validates a TOML definition file.
pub fn load_definition(path: &Path, default_field: &str) -> Result<SpanQuery, DefinitionError> {
    Ok(QueryDefinition::from_file(path)?.into_query(default_field)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn t(text: &str) -> SpanQuery {
        SpanQuery::term("body", text).unwrap()
    }

    #[test]
    fn term_uses_default_field() {
        let query = parse_definition("type = \"term\"\ntext = \"nine\"", "body").unwrap();
        assert_eq!(query, t("nine"));

        let query =
            parse_definition("type = \"term\"\nfield = \"title\"\ntext = \"nine\"", "body").unwrap();
        assert_eq!(query.field(), "title");
    }

    #[test]
    fn near_defaults() {
        let toml = r#"
            type = "near"
            clauses = [{ type = "term", text = "a" }, { type = "term", text = "b" }]
        "#;
        assert_eq!(
            parse_definition(toml, "body").unwrap(),
            SpanQuery::near(vec![t("a"), t("b")], 0, true).unwrap()
        );
    }

    #[test]
    fn nested_tables() {
        let toml = r#"
            type = "not"
            pre = 1

            [include]
            type = "near"
            slop = 4
            in_order = false
            collect_payloads = false
            clauses = [
                { type = "term", text = "nine" },
                { type = "or", clauses = [{ type = "term", text = "six" }, { type = "term", text = "seven" }] },
            ]

            [exclude]
            type = "range"
            start = 0
            end = 2
            inner = { type = "term", text = "forty" }
        "#;
        let expected = SpanQuery::not(
            SpanQuery::near(
                vec![t("nine"), SpanQuery::or(vec![t("six"), t("seven")]).unwrap()],
                4,
                false,
            )
            .unwrap()
            .collect_payloads(false),
            SpanQuery::range(t("forty"), 0, 2).unwrap(),
            1,
            0,
        )
        .unwrap();
        assert_eq!(parse_definition(toml, "body").unwrap(), expected);
    }

    #[test]
    fn payloads_are_utf8_strings() {
        let toml = r#"
            type = "near_payload"
            payloads = ["pos: 1", "pos: 0"]
            inner = { type = "first", end = 3, inner = { type = "term", text = "a" } }
        "#;
        let expected = SpanQuery::near_payload_check(
            SpanQuery::first(t("a"), 3),
            vec![b"pos: 1".to_vec(), b"pos: 0".to_vec()],
        );
        assert_eq!(parse_definition(toml, "body").unwrap(), expected);
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let toml = r#"
            type = "near"
            clauses = [{ type = "term", text = "a" }]
        "#;
        assert!(matches!(
            parse_definition(toml, "body"),
            Err(DefinitionError::Invalid(InvalidQuery::TooFewClauses { .. }))
        ));
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        assert!(matches!(
            parse_definition("type = \"phrase\"", "body"),
            Err(DefinitionError::ParseToml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "type = \"first\"\nend = 1\n[inner]\ntype = \"term\"\ntext = \"five\"")
            .unwrap();
        assert_eq!(
            load_definition(file.path(), "body").unwrap(),
            SpanQuery::first(t("five"), 1)
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_definition(Path::new("/nonexistent/query.toml"), "body").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/query.toml"));
    }
}
