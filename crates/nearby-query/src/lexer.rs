//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of positioned tokens for the
//! parser. Keywords are case-sensitive: `OR`, `NOT` and distance operators
//! such as `3W` or a bare `N` must be written in upper case, so lower-case words like
//! "or" and "not" stay searchable.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare word (search term).
    Term(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// The OR keyword.
    Or,

    /// The NOT keyword.
    Not,

    /// Proximity operator, e.g. "3W" produces `Distance { distance: 3, ordered: true }`.
    Distance {
        /// Maximum distance between neighbouring operands, at least 1.
        distance: u32,
        /// `W` (ordered) rather than `N` (unordered).
        ordered: bool,
    },

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g., "title:" produces FieldPrefix("title")).
    FieldPrefix(String),
}

/// A token and the byte position where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    /// The token.
    pub token: Token,
    /// Byte offset of the token's first character.
    pub position: usize,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> LexError {
        LexError::new(message, position, self.input)
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Lexeme>, LexError> {
        let mut lexemes = Vec::new();

        loop {
            self.skip_whitespace();
            let position = self.position;
            let Some(token) = self.next_token()? else {
                break;
            };
            lexemes.push(Lexeme { token, position });
        }

        Ok(lexemes)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_phrase(),
            '(' => {
                self.advance();
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.advance();
                Ok(Some(Token::RParen))
            }
            _ => self.read_word(),
        }
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance();

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance();
                    return Ok(Some(Token::Phrase(content)));
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Err(self.error_at("unclosed quote", start_pos)),
            }
        }
    }

    /// Reads a term, keyword, distance operator, or field prefix.
    fn read_word(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }

            if ch == ':' {
                self.advance();
                if word.is_empty() {
                    // Bare colon, treat as part of next term
                    continue;
                }
                return Ok(Some(Token::FieldPrefix(word)));
            }

            word.push(ch);
            self.advance();
        }

        if word.is_empty() {
            return Ok(None);
        }

        match word.as_str() {
            "OR" => return Ok(Some(Token::Or)),
            "NOT" => return Ok(Some(Token::Not)),
            _ => {}
        }

        if let Some(token) = self.distance(&word, start_pos)? {
            return Ok(Some(token));
        }

        Ok(Some(Token::Term(word)))
    }

    /// Recognizes `<digits>W` and `<digits>N`. A bare `W` or `N` is distance 1.
    fn distance(&self, word: &str, start_pos: usize) -> Result<Option<Token>, LexError> {
        let ordered = match word.chars().last() {
            Some('W') => true,
            Some('N') => false,
            _ => return Ok(None),
        };
        let digits = &word[..word.len() - 1];
        if digits.is_empty() {
            return Ok(Some(Token::Distance {
                distance: 1,
                ordered,
            }));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        match digits.parse::<u32>() {
            Ok(0) => Err(self.error_at("distance must be at least 1", start_pos)),
            Ok(distance) => Ok(Some(Token::Distance { distance, ordered })),
            Err(_) => Err(self.error_at(format!("distance too large: {digits}"), start_pos)),
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Convenience function to tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, LexError> {
    Lexer::new(input).tokenize()
}
