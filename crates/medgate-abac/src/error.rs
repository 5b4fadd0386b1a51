//! Error types for compiling, populating and evaluating policies.
//!
//! Compilation failures ([`LexError`], [`ParseError`]) are hard failures
//! returned before any evaluation happens. [`EvalError`] never escapes as an
//! `Err`: it is recorded on the [`Decision`](crate::Decision) as a diagnostic
//! while the decision itself fails closed.

use serde::Serialize;
use thiserror::Error;

use crate::ast::CompareOp;
use crate::value::ValueKind;

/// A malformed token in a policy expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A quote was opened and never closed.
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },

    /// A numeric literal that is not an `i64`: a lone `-`, digits running
    /// into letters or dots, or a value out of range.
    #[error("malformed integer literal {literal:?} at byte {offset}")]
    MalformedInteger { offset: usize, literal: String },

    /// A character that cannot start any token.
    #[error("unrecognized character {found:?} at byte {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    /// The policy text exceeds the configured size limit.
    #[error("policy is {len} bytes, limit is {limit}")]
    InputTooLong { len: usize, limit: usize },
}

impl LexError {
    /// Byte offset in the policy text where lexing failed.
    pub fn offset(&self) -> usize {
        match self {
            Self::UnterminatedString { offset }
            | Self::MalformedInteger { offset, .. }
            | Self::UnexpectedCharacter { offset, .. } => *offset,
            Self::InputTooLong { limit, .. } => *limit,
        }
    }
}

/// A structurally invalid policy expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at token {position} (byte {offset}): expected {expected}, found {found}")]
pub struct ParseError {
    /// Index of the offending token in the token stream.
    pub position: usize,
    /// Byte offset of the offending token in the policy text.
    pub offset: usize,
    /// What the grammar allowed at this point.
    pub expected: String,
    /// Description of the token actually present.
    pub found: String,
}

/// Failure to compile policy text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failure to store an attribute in a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context already holds its maximum number of attributes.
    #[error("attribute context is full ({capacity} attributes)")]
    CapacityExceeded { capacity: usize },

    /// Attribute names must be non-empty.
    #[error("attribute name must not be empty")]
    InvalidName,

    /// A JSON value that is not a string, an `i64` or a boolean.
    #[error("attribute {name:?} has unsupported value {value}")]
    UnsupportedValue { name: String, value: String },

    /// JSON input that is not a flat object.
    #[error("attribute context must be a JSON object: {0}")]
    InvalidJson(String),
}

/// A comparison that could not be evaluated.
///
/// Treated as `false` by the surrounding boolean operators and reported on
/// the final decision.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum EvalError {
    /// The attribute's runtime type differs from the literal it is
    /// compared against.
    #[error("type mismatch on `{attribute}`: expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// An ordering operator applied to non-integer operands.
    #[error("operator `{op}` is not defined for {kind} attribute `{attribute}`")]
    UnsupportedOperator {
        attribute: String,
        op: CompareOp,
        kind: ValueKind,
    },
}

impl EvalError {
    /// Name of the attribute whose comparison failed.
    pub fn attribute(&self) -> &str {
        match self {
            Self::TypeMismatch { attribute, .. } | Self::UnsupportedOperator { attribute, .. } => {
                attribute
            }
        }
    }
}

/// Error returned to the request layer by
/// [`PolicyEngine::enforce`](crate::PolicyEngine::enforce).
#[derive(Debug, Error)]
pub enum EnforcementError {
    /// The policy evaluated to DENY.
    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    /// The policy could not be compiled; the request is refused.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_offsets() {
        assert_eq!(LexError::UnterminatedString { offset: 8 }.offset(), 8);
        assert_eq!(
            LexError::UnexpectedCharacter {
                offset: 3,
                found: '$'
            }
            .offset(),
            3
        );
        assert_eq!(
            LexError::InputTooLong {
                len: 100,
                limit: 10
            }
            .offset(),
            10
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = ParseError {
            position: 2,
            offset: 7,
            expected: "literal".to_string(),
            found: "end of input".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at token 2 (byte 7): expected literal, found end of input"
        );
    }

    #[test]
    fn test_eval_error_serializes_tagged() {
        let err = EvalError::TypeMismatch {
            attribute: "level".to_string(),
            expected: ValueKind::Integer,
            found: ValueKind::String,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "type_mismatch");
        assert_eq!(json["attribute"], "level");
        assert_eq!(json["expected"], "Integer");
        assert_eq!(json["found"], "String");
        assert_eq!(err.attribute(), "level");
    }

    #[test]
    fn test_unsupported_operator_serializes_operand_kind() {
        let err = EvalError::UnsupportedOperator {
            attribute: "role".to_string(),
            op: CompareOp::Gt,
            kind: ValueKind::String,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "unsupported_operator");
        assert_eq!(json["kind"], "String");
        assert_eq!(json["op"], "Gt");
        assert_eq!(json["attribute"], "role");
    }
}
