//! Tokenizer for policy expressions.
//!
//! Policy text is ASCII outside of string literals. Keywords (`AND`, `OR`,
//! `NOT`) and booleans (`true`, `false`) are case-insensitive; identifiers
//! are case-sensitive and may contain dots (`resource.department`).

use std::fmt;

use crate::ast::CompareOp;
use crate::error::LexError;

/// Default upper bound on the size of policy text, in bytes.
pub const DEFAULT_MAX_POLICY_BYTES: usize = 16 * 1024;

/// The kind and payload of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    String(String),
    Integer(i64),
    Boolean(bool),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
            Self::String(s) => write!(f, "string {s:?}"),
            Self::Integer(i) => write!(f, "integer {i}"),
            Self::Boolean(b) => write!(f, "boolean {b}"),
            Self::Op(op) => write!(f, "operator `{op}`"),
            Self::And => f.write_str("`AND`"),
            Self::Or => f.write_str("`OR`"),
            Self::Not => f.write_str("`NOT`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Splits policy text into tokens. The last token is always [`TokenKind::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    tokenize_with_limit(input, DEFAULT_MAX_POLICY_BYTES)
}

/// Like [`tokenize`] with an explicit size limit.
pub fn tokenize_with_limit(input: &str, max_bytes: usize) -> Result<Vec<Token>, LexError> {
    if input.len() > max_bytes {
        return Err(LexError::InputTooLong {
            len: input.len(),
            limit: max_bytes,
        });
    }

    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let offset = self.pos;
        let Some(b) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset,
            });
        };

        let kind = match b {
            b'(' => {
                self.pos += 1;
                TokenKind::LParen
            }
            b')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            b'"' | b'\'' => self.lex_string(b)?,
            b'-' | b'0'..=b'9' => self.lex_integer()?,
            b'=' | b'!' | b'<' | b'>' => self.lex_operator()?,
            b if is_ident_start(b) => self.lex_word(),
            _ => return Err(self.unexpected(offset)),
        };

        Ok(Token { kind, offset })
    }

    fn lex_string(&mut self, quote: u8) -> Result<TokenKind, LexError> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                // Both quote characters are ASCII, so these are char boundaries.
                let value = &self.input[start..self.pos];
                self.pos += 1;
                return Ok(TokenKind::String(value.to_string()));
            }
            self.pos += 1;
        }
        Err(LexError::UnterminatedString { offset: open })
    }

    fn lex_integer(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        // Swallow anything glued onto the digits so `3.5` or `12abc` is
        // reported as one malformed literal rather than two tokens.
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            self.pos += 1;
        }

        let literal = &self.input[start..self.pos];
        literal
            .parse::<i64>()
            .map(TokenKind::Integer)
            .map_err(|_| LexError::MalformedInteger {
                offset: start,
                literal: literal.to_string(),
            })
    }

    fn lex_operator(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        let op = match (self.peek(), self.peek_at(1)) {
            (Some(b'='), Some(b'=')) => CompareOp::Eq,
            (Some(b'!'), Some(b'=')) => CompareOp::Ne,
            (Some(b'>'), Some(b'=')) => CompareOp::Ge,
            (Some(b'<'), Some(b'=')) => CompareOp::Le,
            (Some(b'>'), _) => {
                self.pos += 1;
                return Ok(TokenKind::Op(CompareOp::Gt));
            }
            (Some(b'<'), _) => {
                self.pos += 1;
                return Ok(TokenKind::Op(CompareOp::Lt));
            }
            // A lone `=` or `!`
            _ => return Err(self.unexpected(start)),
        };
        self.pos += 2;
        Ok(TokenKind::Op(op))
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];

        if word.eq_ignore_ascii_case("and") {
            TokenKind::And
        } else if word.eq_ignore_ascii_case("or") {
            TokenKind::Or
        } else if word.eq_ignore_ascii_case("not") {
            TokenKind::Not
        } else if word.eq_ignore_ascii_case("true") {
            TokenKind::Boolean(true)
        } else if word.eq_ignore_ascii_case("false") {
            TokenKind::Boolean(false)
        } else {
            TokenKind::Identifier(word.to_string())
        }
    }

    fn unexpected(&self, offset: usize) -> LexError {
        let found = self
            .input
            .get(offset..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or('\u{FFFD}');
        LexError::UnexpectedCharacter { offset, found }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

// ============================================================================
// Tests
// ============================================================================
