//! Abstract syntax tree for policy expressions.
//!
//! The node set is closed: a comparison always pits an attribute reference
//! against a literal, and the only combinators are `AND`, `OR` and `NOT`.
//! Grouping parentheses leave no trace beyond the shape of the tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::AttributeContext;
use crate::value::AttributeValue;

// ============================================================================
// Comparison Operators
// ============================================================================

/// One of the six comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    /// The operator as written in policy text.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Returns `true` for `>`, `<`, `>=` and `<=`, which are only defined
    /// on integers.
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Ge | Self::Le)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// A named attribute, resolved against the context at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRef(pub String);

impl AttributeRef {
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Looks the attribute up. `None` is the default-deny signal.
    pub fn resolve<'c>(&self, ctx: &'c AttributeContext) -> Option<&'c AttributeValue> {
        ctx.get(&self.0)
    }
}

/// A constant written in the policy text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(pub AttributeValue);

impl Literal {
    pub fn value(&self) -> &AttributeValue {
        &self.0
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// A parsed policy expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// `attribute op literal`
    Comparison {
        op: CompareOp,
        left: AttributeRef,
        right: Literal,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Builds `attribute op value`.
    ///
    /// Any value is accepted, but a string holding both quote characters
    /// has no policy-text spelling; see [`Expr::has_text_form`].
    pub fn compare(attribute: &str, op: CompareOp, value: impl Into<AttributeValue>) -> Self {
        Self::Comparison {
            op,
            left: AttributeRef(attribute.to_string()),
            right: Literal(value.into()),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::Or(Box::new(lhs), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Self::Not(Box::new(expr))
    }

    /// Returns `true` if every literal can be written in policy text, so the
    /// `Display` output re-parses to this tree.
    pub fn has_text_form(&self) -> bool {
        match self {
            Self::Comparison { right, .. } => right.value().has_literal_form(),
            Self::And(l, r) | Self::Or(l, r) => l.has_text_form() && r.has_text_form(),
            Self::Not(e) => e.has_text_form(),
        }
    }

    /// Number of nodes in the tree, counting each comparison as one.
    pub fn node_count(&self) -> usize {
        match self {
            Self::Comparison { .. } => 1,
            Self::And(l, r) | Self::Or(l, r) => 1 + l.node_count() + r.node_count(),
            Self::Not(e) => 1 + e.node_count(),
        }
    }

    /// Attribute names referenced anywhere in the tree, in first-seen order.
    pub fn attributes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_attributes(&mut names);
        names
    }

    fn collect_attributes<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Comparison { left, .. } => {
                if !names.contains(&left.name()) {
                    names.push(left.name());
                }
            }
            Self::And(l, r) | Self::Or(l, r) => {
                l.collect_attributes(names);
                r.collect_attributes(names);
            }
            Self::Not(e) => e.collect_attributes(names),
        }
    }
}

/// Canonical form with only the parentheses precedence requires.
///
/// Left-deep `AND`/`OR` chains print flat, so the output nests no deeper
/// than the text it was parsed from. Re-parsing yields an equal tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison { op, left, right } => {
                write!(f, "{} {} {}", left.name(), op, right.value())
            }
            Self::Or(l, r) => {
                write!(f, "{l} OR ")?;
                write_operand(f, r, matches!(**r, Self::Or(..)))
            }
            Self::And(l, r) => {
                write_operand(f, l, matches!(**l, Self::Or(..)))?;
                f.write_str(" AND ")?;
                write_operand(f, r, r.is_binary())
            }
            Self::Not(e) => {
                f.write_str("NOT ")?;
                write_operand(f, e, e.is_binary())
            }
        }
    }
}

impl Expr {
    fn is_binary(&self) -> bool {
        matches!(self, Self::And(..) | Self::Or(..))
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

// ============================================================================
// Tests
// ============================================================================
