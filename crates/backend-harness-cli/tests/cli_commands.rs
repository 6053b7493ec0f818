// crates/backend-harness-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for the backend-harness binary.
// Purpose: Ensure commands emit JSON on stdout and fail closed on bad input.
// Dependencies: backend-harness-cli binary
// ============================================================================
//! ## Overview
//! Runs the compiled binary against temporary config files and checks its
//! stdout, stderr, and exit status.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn harness_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_backend-harness"))
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("backend-harness.toml");
    fs::write(&path, content.trim()).expect("write config");
    path
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(harness_bin())
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("BACKEND_HARNESS_FLAGS")
        .env_remove("RUST_LOG")
        .output()
        .expect("run backend-harness")
}

fn stdout_json(output: &Output) -> Value {
    let text = String::from_utf8(output.stdout.clone()).expect("utf-8 stdout");
    serde_json::from_str(text.trim()).expect("json stdout")
}

const CONFIG: &str = r#"
[flags]
DEBUG = false

[[backends]]
name = "cpu"

[[backends]]
name = "webgl"
priority = 2
"#;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn resolve_reports_backend_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = run(&config, &["resolve", "--", "--backend", "cpu", "--flags", r#"{"IS_NODE": true}"#]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({"backend": "cpu", "source": "args", "flags": {"IS_NODE": true}})
    );
}

#[test]
fn resolve_echoes_whole_number_flags_as_integers() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = run(&config, &["resolve", "--", "--backend", "cpu", "--flags", r#"{"A":1,"B":2.5}"#]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text.trim(), r#"{"backend":"cpu","source":"args","flags":{"A":1,"B":2.5}}"#);
}

#[test]
fn resolve_without_override_uses_priority() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = run(&config, &["resolve", "--", "--single-run"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({"backend": "webgl", "source": "priority", "flags": {}}));
}

#[test]
fn resolve_fails_for_unknown_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = run(&config, &["resolve", "--", "--backend", "unknown"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("backend unknown is not registered"));
}

#[test]
fn check_exit_code_follows_satisfaction() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);

    let output = run(&config, &["check", "--constraints", r#"{"DEBUG": false}"#]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({"satisfied": true}));

    let output = run(&config, &["check", "--constraints", r#"{"DEBUG": true}"#]);
    assert!(!output.status.success());
    assert_eq!(stdout_json(&output), json!({"satisfied": false}));

    let output = run(
        &config,
        &["check", "--constraints", r#"{"DEBUG": true}"#, "--flags", r#"{"DEBUG": true}"#],
    );
    assert!(output.status.success());
}

#[test]
fn backends_lists_priority_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = run(&config, &["backends"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "webgl\ncpu\n");
}

#[test]
fn invalid_config_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "[run]\ndefault_backend = \"missing\"\n");
    let output = run(&config, &["backends"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config"));
}
