//! Check command: compile a policy and show its canonical form.

use std::path::Path;

use anyhow::{Result, bail};

use crate::style::colors::SemanticStyle;
use crate::style::{print_labeled, print_success};

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

    print_success("Policy compiles");
    print_labeled("canonical", &compiled.to_string().code());
    print_labeled("attributes", &compiled.expr().attributes().join(", "));
    print_labeled("nodes", &compiled.expr().node_count().to_string());
    Ok(())
}
