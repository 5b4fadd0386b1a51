//! Integration tests for CLI commands.
//!
//! Each test runs in a fresh temporary project directory so no
//! medgate.toml from the working tree leaks in.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn medgate(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("medgate").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--project")
        .arg(project.path());
    cmd
}

// ============================================================================
// Check / Explain
// ============================================================================

#[test]
fn check_prints_canonical_form() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["check", "role == 'Doctor' and (clearance > 2 or on_call == TRUE)"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "role == \"Doctor\" AND (clearance > 2 OR on_call == true)",
        ))
        .stdout(predicate::str::contains("role, clearance, on_call"));
}

#[test]
fn check_long_chain_canonical_form_stays_flat() {
    let temp = TempDir::new().unwrap();
    let policy = vec!["ward == 3"; 80].join(" OR ");

    let output = medgate(&temp)
        .args(["check", &policy])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    // Flat chains print flat, so the canonical line is the input itself.
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains(&format!("canonical: {policy}")));
}

#[test]
fn check_reports_parse_error_location() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["check", "role =="])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected literal"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn check_reports_lex_error() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["check", "role == \"Doctor"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unterminated string"));
}

#[test]
fn check_builtin_policy() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["check", "@owner-or-admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resource.is_owner"));
}

#[test]
fn check_unknown_builtin_fails() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["check", "@nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown built-in policy"));
}

#[test]
fn explain_shows_tokens_and_tree() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["explain", "NOT role == 'Nurse'"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tokens"))
        .stdout(predicate::str::contains("`NOT`"))
        .stdout(predicate::str::contains("role == \"Nurse\" (string)"));
}

// ============================================================================
// Eval
// ============================================================================

#[test]
fn eval_allow_exits_zero() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "role == 'Doctor' AND clearance > 3"])
        .args(["-a", "role=Doctor", "-a", "clearance=5"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("ALLOW"));
}

#[test]
fn eval_deny_exits_two() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "role == 'Doctor'", "-a", "role=Nurse"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DENY"));
}

#[test]
fn eval_missing_attribute_denies() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "clearance > 3"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DENY"))
        .stdout(predicate::str::contains("diagnostic").not());
}

#[test]
fn eval_type_mismatch_shows_diagnostic() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "clearance > 3", "-a", "clearance='4'"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("type mismatch on `clearance`"));
}

#[test]
fn eval_json_context_and_report() {
    let temp = TempDir::new().unwrap();
    let output = medgate(&temp)
        .args(["eval", "@owner-or-admin", "--format", "json"])
        .args(["--json", r#"{"role": "LabTech", "resource.is_owner": true}"#])
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["effect"], "Allow");
    assert_eq!(report["diagnostics"], serde_json::json!([]));
    assert!(report["policy"].as_str().unwrap().contains("resource.is_owner"));
}

#[test]
fn eval_invalid_json_fails() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "role == 'Admin'", "--json", "[1, 2]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid --json attributes"));
}

#[test]
fn eval_uncompilable_policy_is_error_not_deny() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["eval", "role = 'Admin'", "-a", "role=Admin"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DENY").not());
}

// ============================================================================
// Policies / Config
// ============================================================================

#[test]
fn policies_lists_builtins() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .arg("policies")
        .assert()
        .success()
        .stdout(predicate::str::contains("@clinical-staff"))
        .stdout(predicate::str::contains("@sensitive-record"));
}

#[test]
fn policies_json_is_array() {
    let temp = TempDir::new().unwrap();
    let output = medgate(&temp)
        .args(["policies", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let policies: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(policies.as_array().unwrap().len(), 6);
}

#[test]
fn config_show_defaults() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["config", "show", "--format", "toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_attributes = 64"))
        .stdout(predicate::str::contains("[audit]"));
}

#[test]
fn config_show_reads_project_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("medgate.toml"),
        "[engine]\ncache_capacity = 7\n",
    )
    .unwrap();

    medgate(&temp)
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cache_capacity\": 7"));
}

#[test]
fn config_policy_size_limit_applies_to_eval() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("medgate.toml"),
        "[engine]\nmax_policy_bytes = 8\n",
    )
    .unwrap();

    medgate(&temp)
        .args(["eval", "role == 'Doctor'", "-a", "role=Doctor"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("limit is 8"));
}

#[test]
fn config_validate_rejects_zero_limits() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("medgate.toml"),
        "[engine]\nmax_attributes = 0\n",
    )
    .unwrap();

    medgate(&temp)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attributes"));
}

#[test]
fn config_validate_accepts_defaults() {
    let temp = TempDir::new().unwrap();
    medgate(&temp)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}
