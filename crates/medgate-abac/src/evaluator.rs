//! ABAC policy evaluation.
//!
//! Walks an [`Expr`] against an [`AttributeContext`] and reduces it to an
//! ALLOW/DENY [`Decision`]. Every node yields `true`, `false`, or an
//! [`EvalError`]:
//!
//! - A comparison on an absent attribute is `false`. Missing context is the
//!   designed default-deny signal and is not reported.
//! - A comparison on an attribute of the wrong type, or an ordering
//!   operator on non-integers, is an [`EvalError`]. It is recorded as a
//!   diagnostic and treated as `false` when `AND`/`OR` decide whether to
//!   short-circuit.
//! - A result that was decided by an error stays an error, so `NOT` can
//!   never turn a failed comparison into a grant.
//! - Branches skipped by short-circuiting are never evaluated, and errors
//!   they would have raised are never reported.
//!
//! The root must be `true` for ALLOW. Anything else is DENY.

use serde::{Deserialize, Serialize};

use crate::ast::{AttributeRef, CompareOp, Expr, Literal};
use crate::context::AttributeContext;
use crate::error::EvalError;
use crate::value::AttributeValue;

// ============================================================================
// Effect
// ============================================================================

/// The outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Deny access.
    Deny,
}

impl Default for Effect {
    /// Defaults to `Deny` (deny unless explicitly allowed).
    fn default() -> Self {
        Self::Deny
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("ALLOW"),
            Self::Deny => f.write_str("DENY"),
        }
    }
}

// ============================================================================
// Decision
// ============================================================================

/// The result of evaluating a policy against a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether access is allowed or denied.
    pub effect: Effect,
    /// Evaluation errors met on the path actually taken, in evaluation
    /// order. For audit logging only; never changes `effect`.
    ///
    /// An `Allow` carries diagnostics only when an `OR` recovered from a
    /// failed comparison on its left side.
    pub diagnostics: Vec<EvalError>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            effect: Effect::Allow,
            diagnostics: Vec::new(),
        }
    }

    pub fn deny() -> Self {
        Self {
            effect: Effect::Deny,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn is_denied(&self) -> bool {
        self.effect == Effect::Deny
    }

    /// All diagnostics joined into one line, or `None` if there are none.
    pub fn diagnostic(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        Some(
            self.diagnostics
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates an expression tree against a context.
///
/// # Postcondition
///
/// Always returns a `Decision` and never panics. Evaluation is pure:
/// the same tree and context always give the same decision.
pub fn evaluate(expr: &Expr, ctx: &AttributeContext) -> Decision {
    let mut diagnostics = Vec::new();
    let effect = match eval_node(expr, ctx, &mut diagnostics) {
        Ok(true) => Effect::Allow,
        Ok(false) | Err(_) => Effect::Deny,
    };
    Decision {
        effect,
        diagnostics,
    }
}

// ============================================================================
// Node Evaluation
// ============================================================================

type Outcome = Result<bool, EvalError>;

fn eval_node(expr: &Expr, ctx: &AttributeContext, diags: &mut Vec<EvalError>) -> Outcome {
    match expr {
        Expr::Comparison { op, left, right } => {
            let outcome = eval_comparison(*op, left, right, ctx);
            if let Err(err) = &outcome {
                tracing::trace!(error = %err, "comparison failed closed");
                diags.push(err.clone());
            }
            outcome
        }

        Expr::And(l, r) => match eval_node(l, ctx, diags) {
            Ok(true) => eval_node(r, ctx, diags),
            Ok(false) => Ok(false),
            // Counts as false: short-circuit, but the result stays tainted.
            Err(err) => Err(err),
        },

        Expr::Or(l, r) => match eval_node(l, ctx, diags) {
            Ok(true) => Ok(true),
            Ok(false) => eval_node(r, ctx, diags),
            Err(err) => match eval_node(r, ctx, diags) {
                Ok(true) => Ok(true),
                Ok(false) => Err(err),
                Err(right_err) => Err(right_err),
            },
        },

        Expr::Not(inner) => eval_node(inner, ctx, diags).map(|b| !b),
    }
}

fn eval_comparison(
    op: CompareOp,
    left: &AttributeRef,
    right: &Literal,
    ctx: &AttributeContext,
) -> Outcome {
    let Some(actual) = left.resolve(ctx) else {
        return Ok(false);
    };
    let expected = right.value();

    if actual.kind() != expected.kind() {
        return Err(EvalError::TypeMismatch {
            attribute: left.name().to_string(),
            expected: expected.kind(),
            found: actual.kind(),
        });
    }

    match op {
        CompareOp::Eq => Ok(actual == expected),
        CompareOp::Ne => Ok(actual != expected),
        CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
            let (AttributeValue::Integer(a), AttributeValue::Integer(b)) = (actual, expected)
            else {
                return Err(EvalError::UnsupportedOperator {
                    attribute: left.name().to_string(),
                    op,
                    kind: actual.kind(),
                });
            };
            Ok(match op {
                CompareOp::Gt => a > b,
                CompareOp::Lt => a < b,
                CompareOp::Ge => a >= b,
                _ => a <= b,
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
