#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use medgate_abac::evaluator::evaluate;
use medgate_abac::{AttributeContext, AttributeValue, CompareOp, Effect, Expr, parse};

/// Small fixed name pool so comparisons actually hit the context.
const NAMES: [&str; 4] = ["role", "clearance", "on_call", "resource.department"];

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl From<FuzzOp> for CompareOp {
    fn from(op: FuzzOp) -> Self {
        match op {
            FuzzOp::Eq => CompareOp::Eq,
            FuzzOp::Ne => CompareOp::Ne,
            FuzzOp::Gt => CompareOp::Gt,
            FuzzOp::Lt => CompareOp::Lt,
            FuzzOp::Ge => CompareOp::Ge,
            FuzzOp::Le => CompareOp::Le,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&FuzzValue> for AttributeValue {
    fn from(value: &FuzzValue) -> Self {
        match value {
            FuzzValue::Str(s) => AttributeValue::String(s.clone()),
            FuzzValue::Int(i) => AttributeValue::Integer(*i),
            FuzzValue::Bool(b) => AttributeValue::Boolean(*b),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzExpr {
    Compare(u8, FuzzOp, FuzzValue),
    And(Box<FuzzExpr>, Box<FuzzExpr>),
    Or(Box<FuzzExpr>, Box<FuzzExpr>),
    Not(Box<FuzzExpr>),
}

impl FuzzExpr {
    /// Depth is capped below the parser's nesting limit so the canonical
    /// form always re-parses.
    fn to_expr(&self, depth: u8) -> Expr {
        let leaf = |slot: u8, op: FuzzOp, value: &FuzzValue| {
            Expr::compare(NAMES[usize::from(slot) % NAMES.len()], op.into(), value)
        };
        if depth > 8 {
            return leaf(0, FuzzOp::Eq, &FuzzValue::Bool(true));
        }
        match self {
            Self::Compare(slot, op, value) => leaf(*slot, *op, value),
            Self::And(l, r) => Expr::and(l.to_expr(depth + 1), r.to_expr(depth + 1)),
            Self::Or(l, r) => Expr::or(l.to_expr(depth + 1), r.to_expr(depth + 1)),
            Self::Not(e) => Expr::not(e.to_expr(depth + 1)),
        }
    }
}

fuzz_target!(|input: (FuzzExpr, Vec<(u8, FuzzValue)>)| {
    let (fuzz_expr, attrs) = input;
    let expr = fuzz_expr.to_expr(0);

    let mut ctx = AttributeContext::new();
    for (slot, value) in &attrs {
        let name = NAMES[usize::from(*slot) % NAMES.len()];
        ctx.set(name, value).expect("name pool is smaller than capacity");
    }

    let decision = evaluate(&expr, &ctx);

    // Deterministic.
    assert_eq!(decision, evaluate(&expr, &ctx));

    // Fail-closed: negating a policy never turns a diagnosed DENY into ALLOW.
    let negated = evaluate(&Expr::not(expr.clone()), &ctx);
    if decision.is_denied() && !decision.diagnostics.is_empty() {
        let flipped_clean = negated.is_allowed() && negated.diagnostics.is_empty();
        assert!(!flipped_clean, "NOT hid an evaluation error in {expr}");
    }

    // Double negation is transparent.
    let double = evaluate(&Expr::not(Expr::not(expr.clone())), &ctx);
    assert_eq!(double.effect, decision.effect);

    // The canonical text decides the same way.
    if expr.has_text_form() {
        let reparsed = parse(&expr.to_string())
            .unwrap_or_else(|e| panic!("canonical form of {expr:?} failed to parse: {e}"));
        assert_eq!(reparsed.evaluate(&ctx), decision);
    }

    if decision.effect == Effect::Allow {
        assert!(!negated.is_allowed(), "both {expr} and its negation allowed");
    }
});
