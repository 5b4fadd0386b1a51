//! Recursive-descent parser for policy expressions.
//!
//! # Grammar
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ( "OR" and_expr )*
//! and_expr   := not_expr ( "AND" not_expr )*
//! not_expr   := "NOT" not_expr | comparison
//! comparison := IDENTIFIER comp_op literal | "(" expr ")"
//! comp_op    := "==" | "!=" | ">" | "<" | ">=" | "<="
//! literal    := STRING | INTEGER | BOOLEAN
//! ```
//!
//! `OR` binds loosest, then `AND`, then `NOT`. Both binary operators are
//! left-associative. The right-hand side of a comparison must be a literal.
//!
//! Two limits keep every later tree walk shallow: parentheses and `NOT`
//! nest at most [`MAX_NESTING_DEPTH`] deep, and a policy holds at most
//! [`MAX_EXPR_NODES`] nodes, which also bounds left-deep `AND`/`OR` chains.

use crate::ast::{AttributeRef, Expr, Literal};
use crate::error::{EngineError, ParseError};
use crate::lexer::{DEFAULT_MAX_POLICY_BYTES, Token, TokenKind, tokenize_with_limit};
use crate::value::AttributeValue;

/// Maximum nesting of parentheses and `NOT` before parsing is refused.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Maximum number of nodes in one expression tree.
pub const MAX_EXPR_NODES: usize = 4096;

/// Tokenizes and parses policy text into an expression tree.
pub fn parse_expr(input: &str) -> Result<Expr, EngineError> {
    parse_expr_with_limit(input, DEFAULT_MAX_POLICY_BYTES)
}

/// Like [`parse_expr`] with an explicit size limit on the policy text.
pub fn parse_expr_with_limit(input: &str, max_bytes: usize) -> Result<Expr, EngineError> {
    let tokens = tokenize_with_limit(input, max_bytes)?;
    Ok(Parser::new(tokens).parse()?)
}

struct Parser {
    /// Always ends with an `Eof` token.
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let offset = tokens.last().map_or(0, |t| t.offset);
            tokens.push(Token {
                kind: TokenKind::Eof,
                offset,
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) {
        if self.current().kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError {
            position: self.pos,
            offset: token.offset,
            expected: expected.to_string(),
            found: token.kind.to_string(),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error(&format!("nesting depth of at most {MAX_NESTING_DEPTH}")));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Counts one more node, failing at the current token past the limit.
    fn add_node(&mut self) -> Result<(), ParseError> {
        self.nodes += 1;
        if self.nodes > MAX_EXPR_NODES {
            return Err(self.error(&format!("at most {MAX_EXPR_NODES} expression nodes")));
        }
        Ok(())
    }

    fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_or()?;
        if self.current().kind != TokenKind::Eof {
            return Err(self.error("`AND`, `OR` or end of input"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.current().kind == TokenKind::Or {
            self.add_node()?;
            self.advance();
            let right = self.parse_and()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.current().kind == TokenKind::And {
            self.add_node()?;
            self.advance();
            let right = self.parse_not()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.current().kind != TokenKind::Not {
            return self.parse_comparison();
        }
        self.enter()?;
        self.add_node()?;
        self.advance();
        let inner = self.parse_not()?;
        self.leave();
        Ok(Expr::not(inner))
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        match &self.current().kind {
            TokenKind::LParen => {
                self.enter()?;
                self.advance();
                let expr = self.parse_or()?;
                if self.current().kind != TokenKind::RParen {
                    return Err(self.error("`)`"));
                }
                self.advance();
                self.leave();
                Ok(expr)
            }
            TokenKind::Identifier(name) => {
                let left = AttributeRef(name.clone());
                self.add_node()?;
                self.advance();

                let TokenKind::Op(op) = self.current().kind else {
                    return Err(self.error("comparison operator"));
                };
                self.advance();

                let right = self.parse_literal()?;
                Ok(Expr::Comparison { op, left, right })
            }
            _ => Err(self.error("attribute name, `NOT` or `(`")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let value = match &self.current().kind {
            TokenKind::String(s) => AttributeValue::String(s.clone()),
            TokenKind::Integer(i) => AttributeValue::Integer(*i),
            TokenKind::Boolean(b) => AttributeValue::Boolean(*b),
            _ => return Err(self.error("literal (string, integer or boolean)")),
        };
        self.advance();
        Ok(Literal(value))
    }
}

// ============================================================================
// Tests
// ============================================================================
