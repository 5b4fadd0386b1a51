//! # medgate-abac: Attribute-Based Access Control for hospital records
//!
//! A small boolean policy language over request attributes, and a
//! fail-closed evaluator that turns a policy plus a context into ALLOW or
//! DENY.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Policy text                                 │
//! │  role == "Doctor" AND clearance >= 3         │
//! └─────────────────┬───────────────────────────┘
//!                   │  lexer → parser (cached by PolicyEngine)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  CompiledPolicy (immutable Expr tree)        │
//! └─────────────────┬───────────────────────────┘
//!                   │  + AttributeContext (per request)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Effect (Allow/Deny)                       │
//! │  - Diagnostics (audit only)                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Language
//!
//! Comparisons `attribute op literal` with `== != > < >= <=`, combined with
//! `AND`, `OR`, `NOT` and parentheses. Literals are double- or single-quoted
//! strings, signed integers and `true`/`false`. Keywords are
//! case-insensitive; attribute names are not.
//!
//! ## Fail-closed rules
//!
//! - An absent attribute makes its comparison `false`.
//! - A type mismatch, or ordering on non-integers, is an evaluation error:
//!   recorded, treated as `false` for short-circuiting, and never turned
//!   into ALLOW by `NOT`.
//! - A policy that does not compile is an error, never a decision.
//!
//! ## Examples
//!
//! ```
//! use medgate_abac::{create_context, evaluate, set_attribute, Effect};
//!
//! let mut ctx = create_context();
//! set_attribute(&mut ctx, "role", "Doctor").unwrap();
//! set_attribute(&mut ctx, "clearance", 4).unwrap();
//!
//! let decision = evaluate(r#"role == "Doctor" AND clearance > 3"#, &ctx).unwrap();
//! assert_eq!(decision.effect, Effect::Allow);
//!
//! // Comparing an integer attribute with a string fails closed.
//! let decision = evaluate(r#"clearance == "high""#, &ctx).unwrap();
//! assert_eq!(decision.effect, Effect::Deny);
//! assert!(decision.diagnostic().is_some());
//! ```

pub mod ast;
pub mod attributes;
mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod policy;
pub mod value;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;

pub use ast::{AttributeRef, CompareOp, Expr, Literal};
pub use attributes::{Principal, ResourceAttributes, Role};
pub use context::{AttributeContext, DEFAULT_MAX_ATTRIBUTES};
pub use engine::{
    CacheStats, CompiledPolicy, DEFAULT_CACHE_CAPACITY, PolicyEngine, create_context, evaluate,
    evaluate_compiled, parse, set_attribute,
};
pub use error::{ContextError, EnforcementError, EngineError, EvalError, LexError, ParseError};
pub use evaluator::{Decision, Effect};
pub use lexer::{DEFAULT_MAX_POLICY_BYTES, Token, TokenKind, tokenize};
pub use parser::{MAX_EXPR_NODES, MAX_NESTING_DEPTH};
pub use policy::{NamedPolicy, StandardPolicies};
pub use value::{AttributeValue, ValueKind};
