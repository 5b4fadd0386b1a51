//! Explain command: show how a policy is read.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Result, bail};
use medgate_abac::{Expr, TokenKind, tokenize};

use crate::style::colors::SemanticStyle;

pub fn run(project: &Path, policy_arg: &str) -> Result<()> {
    let policy = super::resolve_policy(policy_arg)?;
    let engine = super::load_engine(project)?;

    let compiled = match engine.compile(&policy) {
        Ok(compiled) => compiled,
        Err(err) => {
            super::report_compile_error(&policy, &err);
            bail!("policy does not compile");
        }
    };

    println!("{}", "Tokens".header());
    for token in tokenize(&policy)? {
        if token.kind == TokenKind::Eof {
            break;
        }
        println!("  {:>4}  {}", token.offset.muted(), token.kind);
    }

    println!();
    println!("{}", "Tree".header());
    print!("{}", render_tree(compiled.expr()));
    Ok(())
}

/// Renders the tree one node per line, children indented below their
/// parent.
pub fn render_tree(expr: &Expr) -> String {
    let mut out = String::new();
    write_node(expr, 1, &mut out);
    out
}

fn write_node(expr: &Expr, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match expr {
        Expr::Comparison { op, left, right } => {
            let _ = writeln!(
                out,
                "{indent}{} {op} {} ({})",
                left.name(),
                right.value(),
                right.value().kind()
            );
        }
        Expr::And(l, r) => {
            let _ = writeln!(out, "{indent}AND");
            write_node(l, depth + 1, out);
            write_node(r, depth + 1, out);
        }
        Expr::Or(l, r) => {
            let _ = writeln!(out, "{indent}OR");
            write_node(l, depth + 1, out);
            write_node(r, depth + 1, out);
        }
        Expr::Not(inner) => {
            let _ = writeln!(out, "{indent}NOT");
            write_node(inner, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medgate_abac::parse;

    #[test]
    fn test_render_tree() {
        let policy = parse("role == 'Doctor' OR NOT clearance < 2").unwrap();
        assert_eq!(
            render_tree(policy.expr()),
            "  OR\n    role == \"Doctor\" (string)\n    NOT\n      clearance < 2 (integer)\n"
        );
    }
}
