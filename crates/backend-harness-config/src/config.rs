// crates/backend-harness-config/src/config.rs
// ============================================================================
// Module: Backend Harness Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: backend-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then the `BACKEND_HARNESS_CONFIG`
//! environment variable, then `backend-harness.toml` in the working directory.
//! Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use backend_harness_core::FlagMap;
use backend_harness_core::FlagValue;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "backend-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BACKEND_HARNESS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured backends.
pub(crate) const MAX_BACKENDS: usize = 64;
/// Maximum length of a backend or flag name.
pub(crate) const MAX_NAME_LENGTH: usize = 128;
/// Maximum number of default flags.
pub(crate) const MAX_FLAGS: usize = 256;
/// Priority used when a backend entry omits one.
const DEFAULT_PRIORITY: i32 = 1;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Backend harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HarnessConfig {
    /// Run selection defaults.
    #[serde(default)]
    pub run: RunConfig,
    /// Default flag values seeded into the environment.
    #[serde(default)]
    pub flags: FlagMap,
    /// Backends registered for dry runs.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run selection defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Backend used when runner arguments request no override.
    #[serde(default)]
    pub default_backend: Option<String>,
}

/// A backend registered for dry runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
    /// Unique backend name.
    pub name: String,
    /// Selection priority; higher wins.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level emitted when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: LogLevel,
}

/// Supported log levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    #[default]
    Warn,
    /// Informational events.
    Info,
    /// Debug events.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_from(&resolved)
    }

    /// Loads configuration, falling back to defaults when no file is named
    /// and the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named or present file fails to load.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let implicit = path.is_none() && env::var_os(CONFIG_ENV_VAR).is_none();
        if implicit && !resolved.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&resolved)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_backends()?;
        self.validate_flags()?;
        self.run.validate(&self.backends)
    }

    /// Reads, parses, and validates the file at `path`.
    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Validates backend entries.
    fn validate_backends(&self) -> Result<(), ConfigError> {
        if self.backends.len() > MAX_BACKENDS {
            return Err(ConfigError::Invalid("too many backends configured".to_string()));
        }
        let mut seen = BTreeSet::new();
        for backend in &self.backends {
            validate_name("backends.name", &backend.name)?;
            if !seen.insert(backend.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate backend name: {}",
                    backend.name
                )));
            }
        }
        Ok(())
    }

    /// Validates default flag entries.
    fn validate_flags(&self) -> Result<(), ConfigError> {
        if self.flags.len() > MAX_FLAGS {
            return Err(ConfigError::Invalid("too many flags configured".to_string()));
        }
        for (name, value) in &self.flags {
            validate_name("flags", name)?;
            if let FlagValue::Number(number) = value
                && !number.is_finite()
            {
                return Err(ConfigError::Invalid(format!("flag {name} must be finite")));
            }
        }
        Ok(())
    }
}

impl RunConfig {
    /// Validates run defaults against the configured backends.
    fn validate(&self, backends: &[BackendConfig]) -> Result<(), ConfigError> {
        let Some(default_backend) = &self.default_backend else {
            return Ok(());
        };
        validate_name("run.default_backend", default_backend)?;
        if !backends.iter().any(|backend| &backend.name == default_backend) {
            return Err(ConfigError::Invalid(format!(
                "run.default_backend {default_backend} is not a configured backend"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default backend priority for serde.
const fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// Resolves the config path from caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a backend or flag name.
fn validate_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}
