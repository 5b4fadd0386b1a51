//! Eval command: decide one request.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use medgate_abac::{AttributeContext, AttributeValue, Decision, Effect};
use serde::Serialize;

use crate::OutputFormat;
use crate::style::colors::SemanticStyle;
use crate::style::print_labeled;

/// Exit code for a DENY decision. `1` is reserved for usage and compile
/// errors.
const DENY_EXIT_CODE: u8 = 2;

/// Parses `name=value` for `--attr`.
///
/// The value is typed with [`AttributeValue::infer`] unless it is wrapped
/// in matching single or double quotes, which forces a string.
pub fn parse_attribute(raw: &str) -> Result<(String, AttributeValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("attribute name must not be empty".to_string());
    }

    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    let value = if quoted {
        AttributeValue::String(value[1..value.len() - 1].to_string())
    } else {
        AttributeValue::infer(value)
    };
    Ok((name.to_string(), value))
}

pub fn exit_code(effect: Effect) -> ExitCode {
    match effect {
        Effect::Allow => ExitCode::SUCCESS,
        Effect::Deny => ExitCode::from(DENY_EXIT_CODE),
    }
}

#[derive(Serialize)]
struct Report<'a> {
    policy: &'a str,
    #[serde(flatten)]
    decision: &'a Decision,
}

pub fn run(
    project: &Path,
    policy_arg: &str,
    attributes: Vec<(String, AttributeValue)>,
    json: Option<&str>,
    format: OutputFormat,
) -> Result<Effect> {
    let policy = super::resolve_policy(policy_arg)?;
    let engine = super::load_engine(project)?;

    let ctx = match json {
        Some(text) => AttributeContext::from_json_str(text, engine.max_attributes())
            .context("Invalid --json attributes")?,
        None => {
            let mut ctx = engine.new_context();
            for (name, value) in attributes {
                ctx.set(&name, value)
                    .with_context(|| format!("Cannot set attribute `{name}`"))?;
            }
            ctx
        }
    };

    let decision = match engine.evaluate(&policy, &ctx) {
        Ok(decision) => decision,
        Err(err) => {
            super::report_compile_error(&policy, &err);
            bail!("policy does not compile");
        }
    };

    match format {
        OutputFormat::Json => {
            let report = Report {
                policy: &policy,
                decision: &decision,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            match decision.effect {
                Effect::Allow => println!("{}", "ALLOW".allow()),
                Effect::Deny => println!("{}", "DENY".deny()),
            }
            for diagnostic in &decision.diagnostics {
                print_labeled("diagnostic", &diagnostic.to_string().warning());
            }
        }
    }

    Ok(decision.effect)
}
