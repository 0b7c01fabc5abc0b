//! Query parser.
//!
//! Parses a token stream into a [`SpanQuery`] using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query     → or_expr
//! or_expr   → not_expr ("OR" not_expr)*
//! not_expr  → n_expr ("NOT" n_expr)?
//! n_expr    → w_expr (N_OP w_expr)*
//! w_expr    → primary (W_OP primary)*
//! primary   → TERM | PHRASE | FIELD_PREFIX primary | "(" or_expr ")"
//! W_OP      → <n>W | W (ordered)
//! N_OP      → <n>N | N (unordered)
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. Grouping: `(...)`
//! 2. Field prefix: `field:`
//! 3. Ordered distance: `3W`
//! 4. Unordered distance: `3N`
//! 5. Exclusion: `NOT`
//! 6. Union: `OR`
//!
//! A distance of `n` allows `n - 1` unmatched positions between
//! neighbouring operands, so `1W` (or a bare `W`) means adjacent. A run of
//! one distance builds a single proximity query over all its operands
//! (`a 3W b 3W c`); a change of distance at the same level closes the run
//! and makes it the first operand of the next one. Phrases are exact
//! ordered proximity.

use std::mem;

use crate::{
    ast::SpanQuery,
    error::{InvalidQuery, ParseError, QueryError},
    lexer::{Lexeme, Token, tokenize},
};

/// Recursive descent parser for span queries.
struct Parser<'a> {
    /// Token stream to parse.
    tokens: Vec<Lexeme>,
    /// Current position in token stream.
    position: usize,
    /// Field for terms without a field prefix.
    default_field: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Lexeme>, default_field: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            default_field,
        }
    }

    /// Parses the token stream into a query.
    fn parse(mut self) -> Result<Option<SpanQuery>, QueryError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let field = self.default_field;
        let query = self.parse_or_expr(field)?;

        if self.position < self.tokens.len() {
            return Err(self.unexpected());
        }

        Ok(Some(query))
    }

    /// Parses: or_expr → not_expr ("OR" not_expr)*
    fn parse_or_expr(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        let start = self.offset();
        let first = self.parse_not_expr(field)?;
        if !self.check(&Token::Or) {
            return Ok(first);
        }

        let mut clauses = vec![first];
        while self.check(&Token::Or) {
            self.advance();
            clauses.push(self.parse_not_expr(field)?);
        }

        SpanQuery::or(clauses).map_err(|err| QueryError::invalid(err, start))
    }

    /// Parses: not_expr → n_expr ("NOT" n_expr)?
    fn parse_not_expr(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        let start = self.offset();
        let include = self.parse_n_expr(field)?;
        if !self.check(&Token::Not) {
            return Ok(include);
        }

        self.advance();
        if !self.can_start_primary() {
            return Err(self.error("expected expression after NOT"));
        }
        let exclude = self.parse_n_expr(field)?;

        SpanQuery::not(include, exclude, 0, 0).map_err(|err| QueryError::invalid(err, start))
    }

    /// Parses: n_expr → w_expr (N_OP w_expr)*
    fn parse_n_expr(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        self.parse_distance_chain(field, false, Self::parse_w_expr)
    }

    /// Parses: w_expr → primary (W_OP primary)*
    fn parse_w_expr(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        self.parse_distance_chain(field, true, Self::parse_primary)
    }

    /// Parses operands joined by distance operators of one kind.
    fn parse_distance_chain(
        &mut self,
        field: &str,
        ordered: bool,
        operand: fn(&mut Self, &str) -> Result<SpanQuery, QueryError>,
    ) -> Result<SpanQuery, QueryError> {
        let start = self.offset();
        let first = operand(self, field)?;
        let Some(mut distance) = self.peek_distance(ordered) else {
            return Ok(first);
        };

        let mut operands = vec![first];
        while let Some(next) = self.peek_distance(ordered) {
            self.advance();
            if !self.can_start_primary() {
                return Err(self.error("expected expression after distance operator"));
            }
            if next != distance {
                let run = Self::near(mem::take(&mut operands), distance, ordered, start)?;
                operands.push(run);
                distance = next;
            }
            operands.push(operand(self, field)?);
        }

        Self::near(operands, distance, ordered, start)
    }

    /// Builds the proximity query for one run of a distance operator.
    fn near(
        operands: Vec<SpanQuery>,
        distance: u32,
        ordered: bool,
        start: Option<usize>,
    ) -> Result<SpanQuery, QueryError> {
        SpanQuery::near(operands, distance.saturating_sub(1), ordered)
            .map_err(|err| QueryError::invalid(err, start))
    }

    /// Parses: primary → TERM | PHRASE | FIELD_PREFIX primary | "(" or_expr ")"
    fn parse_primary(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        let start = self.offset();
        match self.peek().cloned() {
            Some(Token::Term(text)) => {
                self.advance();
                SpanQuery::term(field, text).map_err(|err| QueryError::invalid(err, start))
            }

            Some(Token::Phrase(text)) => {
                self.advance();
                Self::phrase(field, &text, start)
            }

            Some(Token::FieldPrefix(name)) => {
                self.advance();
                if !self.can_start_primary() {
                    return Err(
                        self.error(format!("expected term, phrase, or group after '{name}:'"))
                    );
                }
                self.parse_primary(&name)
            }

            Some(Token::LParen) => self.parse_group(field),

            _ => Err(self.unexpected()),
        }
    }

    /// Builds an exact ordered proximity query from a phrase's words.
    fn phrase(field: &str, text: &str, start: Option<usize>) -> Result<SpanQuery, QueryError> {
        let invalid = |err: InvalidQuery| QueryError::invalid(err, start);
        let mut words = text
            .split_whitespace()
            .map(|word| SpanQuery::term(field, word).map_err(invalid))
            .collect::<Result<Vec<_>, _>>()?;
        match words.len() {
            0 => Err(ParseError::new("empty phrase", start).into()),
            1 => Ok(words.remove(0)),
            _ => SpanQuery::near(words, 0, true).map_err(invalid),
        }
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self, field: &str) -> Result<SpanQuery, QueryError> {
        self.advance();
        let inner = self.parse_or_expr(field)?;

        match self.peek() {
            Some(Token::RParen) => {
                self.advance();
                Ok(inner)
            }
            None => Err(self.error("expected closing parenthesis")),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Describes the current token as an error.
    fn unexpected(&self) -> QueryError {
        let message = match self.peek() {
            None => "unexpected end of query",
            Some(Token::RParen) => "unexpected closing parenthesis",
            Some(Token::Or) => "unexpected OR (needs expression before it)",
            Some(Token::Not) => "unexpected NOT (needs expression before it, and does not chain)",
            Some(Token::Distance { .. }) => {
                "unexpected distance operator (needs expression before it)"
            }
            Some(Token::Term(_) | Token::Phrase(_) | Token::FieldPrefix(_) | Token::LParen) => {
                "adjacent expressions need an operator between them"
            }
        };
        self.error(message)
    }

    /// A parse error at the current token.
    fn error(&self, message: impl Into<String>) -> QueryError {
        ParseError::new(message, self.offset()).into()
    }

    /// Byte position of the current token, `None` at end of input.
    fn offset(&self) -> Option<usize> {
        self.tokens.get(self.position).map(|lexeme| lexeme.position)
    }

    /// Whether the current token can begin a primary expression.
    fn can_start_primary(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Term(_) | Token::Phrase(_) | Token::FieldPrefix(_) | Token::LParen)
        )
    }

    /// Distance of the current token if it is an operator of the given kind.
    fn peek_distance(&self, ordered: bool) -> Option<u32> {
        match self.peek() {
            Some(Token::Distance {
                distance,
                ordered: kind,
            }) if *kind == ordered => Some(*distance),
            _ => None,
        }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|lexeme| &lexeme.token)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into a [`SpanQuery`].
///
/// Terms without a field prefix search `default_field`. Returns `Ok(None)`
/// for empty queries.
pub fn parse(input: &str, default_field: &str) -> Result<Option<SpanQuery>, QueryError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens, default_field)
        .parse()
        .map_err(|err| err.with_query(input))
}
