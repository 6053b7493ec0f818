//! Config load validation tests for backend-harness-config.
// crates/backend-harness-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use backend_harness_config::ConfigError;
use backend_harness_config::HarnessConfig;
use backend_harness_config::LogLevel;
use backend_harness_core::FlagValue;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<HarnessConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_reads_full_config() -> TestResult {
    let file = write_config(
        br#"
[run]
default_backend = "webgl"

[flags]
DEBUG = false
WEBGL_VERSION = 2
PLATFORM = "node"

[[backends]]
name = "cpu"

[[backends]]
name = "webgl"
priority = 2

[logging]
level = "debug"
"#,
    )?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.run.default_backend.as_deref() != Some("webgl") {
        return Err("default backend not loaded".to_string());
    }
    if config.flags.get("WEBGL_VERSION") != Some(&FlagValue::Number(2.0)) {
        return Err("integer flag not loaded as number".to_string());
    }
    if config.flags.get("DEBUG") != Some(&FlagValue::Bool(false)) {
        return Err("bool flag not loaded".to_string());
    }
    if config.backends.len() != 2 || config.backends[0].priority != 1 || config.backends[1].priority != 2 {
        return Err("backend priorities not loaded".to_string());
    }
    if config.logging.level != LogLevel::Debug {
        return Err("log level not loaded".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(HarnessConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(HarnessConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'a'; 1_048_577])?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(HarnessConfig::load(Some(&path)), "config io error")?;
    assert_invalid(HarnessConfig::load_or_default(Some(&path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_invalid_toml() -> TestResult {
    let file = write_config(b"[run\ndefault_backend = ")?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}
