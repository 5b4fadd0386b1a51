//! CLI command implementations.

pub mod check;
pub mod config;
pub mod eval;
pub mod explain;
pub mod policies;
pub mod version;

use std::path::Path;

use anyhow::{Context, Result, bail};
use medgate_abac::{EngineError, LexError, PolicyEngine, StandardPolicies};
use medgate_config::ConfigLoader;

use crate::style::{print_error, print_location};

/// Expands `@name` to the text of a built-in policy; anything else is
/// returned unchanged.
pub fn resolve_policy(arg: &str) -> Result<String> {
    let Some(name) = arg.strip_prefix('@') else {
        return Ok(arg.to_string());
    };
    match StandardPolicies::by_name(name) {
        Some(policy) => Ok(policy.text.to_string()),
        None => bail!("unknown built-in policy `{name}` (see `medgate policies`)"),
    }
}

/// Loads the merged configuration for `project` and builds an engine.
pub fn load_engine(project: &Path) -> Result<PolicyEngine> {
    let config = ConfigLoader::new()
        .with_project_dir(project)
        .load()
        .context("Failed to load configuration")?;
    Ok(config.build_engine())
}

/// Prints a compile error with a caret under the failing position.
pub fn report_compile_error(policy: &str, err: &EngineError) {
    print_error(&err.to_string());
    match err {
        EngineError::Lex(LexError::InputTooLong { .. }) => {}
        EngineError::Lex(lex) => print_location(policy, lex.offset()),
        EngineError::Parse(parse) => print_location(policy, parse.offset),
    }
}
