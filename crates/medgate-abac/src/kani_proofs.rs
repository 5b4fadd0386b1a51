//! Kani proofs for policy evaluation
//!
//! Bounded model checking of the fail-closed guarantees. Trees are built
//! directly so the proofs do not depend on the lexer.
//!
//! **Proof Count**: 4 proofs
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::ast::{CompareOp, Expr};
#[cfg(kani)]
use crate::context::AttributeContext;
#[cfg(kani)]
use crate::evaluator::{self, Effect};

#[cfg(kani)]
fn any_op() -> CompareOp {
    match kani::any::<u8>() % 6 {
        0 => CompareOp::Eq,
        1 => CompareOp::Ne,
        2 => CompareOp::Gt,
        3 => CompareOp::Lt,
        4 => CompareOp::Ge,
        _ => CompareOp::Le,
    }
}

/// Proof: Missing attribute denies
///
/// **Property**: A comparison on an attribute absent from the context is
/// DENY for every operator and literal, with no diagnostics.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_missing_attribute_denies() {
    let literal: i64 = kani::any();
    let expr = Expr::compare("clearance", any_op(), literal);

    let decision = evaluator::evaluate(&expr, &AttributeContext::new());

    assert_eq!(decision.effect, Effect::Deny);
    assert!(decision.diagnostics.is_empty());
}

/// Proof: Integer ordering matches machine comparison
///
/// **Property**: For all `a`, `b`, `clearance > b` allows exactly when
/// `a > b` where `a` is the context value.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_integer_ordering() {
    let a: i64 = kani::any();
    let b: i64 = kani::any();
    let mut ctx = AttributeContext::new();
    ctx.set("clearance", a).unwrap();

    let decision = evaluator::evaluate(&Expr::compare("clearance", CompareOp::Gt, b), &ctx);

    assert_eq!(decision.effect == Effect::Allow, a > b);
}

/// Proof: Type errors never grant access
///
/// **Property**: A comparison between a boolean attribute and an integer
/// literal denies, with or without a surrounding `NOT`.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_type_error_never_allows() {
    let flag: bool = kani::any();
    let literal: i64 = kani::any();
    let mut ctx = AttributeContext::new();
    ctx.set("on_call", flag).unwrap();

    let comparison = Expr::compare("on_call", any_op(), literal);
    let negated = Expr::not(comparison.clone());

    assert_eq!(evaluator::evaluate(&comparison, &ctx).effect, Effect::Deny);
    assert_eq!(evaluator::evaluate(&negated, &ctx).effect, Effect::Deny);
}

/// Proof: Double negation is identity on well-typed comparisons
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_double_negation() {
    let a: i64 = kani::any();
    let b: i64 = kani::any();
    let mut ctx = AttributeContext::new();
    ctx.set("clearance", a).unwrap();

    let expr = Expr::compare("clearance", any_op(), b);
    let doubled = Expr::not(Expr::not(expr.clone()));

    assert_eq!(
        evaluator::evaluate(&expr, &ctx).effect,
        evaluator::evaluate(&doubled, &ctx).effect
    );
}
