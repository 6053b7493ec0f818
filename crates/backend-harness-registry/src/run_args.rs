// crates/backend-harness-registry/src/run_args.rs
// ============================================================================
// Module: Runner Argument Parsing
// Description: Resolves `--backend` and `--flags` runner arguments.
// Purpose: Decide the backend and flag overrides before any test group runs.
// Dependencies: backend-harness-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Test runners forward their raw argument list to [`parse_run_args`]. The
//! parser recognizes two position-independent options:
//!
//! ```text
//! --backend <name>         select backend by registered name (required if --flags given)
//! --flags <json-object>    JSON object of flag overrides, applied for the run
//! ```
//!
//! Every other token is ignored. When an option repeats, its first
//! occurrence wins.
//! Invariants:
//! - `Ok(None)` means no override was requested; it is never a partial result.
//! - A returned factory is the registry's own factory for the resolved name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use backend_harness_core::FlagEnvironment;
use backend_harness_core::FlagMap;
use backend_harness_core::FlagValue;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::backend::BackendFactory;
use crate::backend::BackendHandle;
use crate::registry::BackendRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token selecting the backend.
pub const BACKEND_ARG: &str = "--backend";
/// Token carrying the flag override object.
pub const FLAGS_ARG: &str = "--flags";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Runner argument errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunArgsError {
    /// `--flags` was supplied without `--backend`.
    #[error("--flags requires --backend to be specified")]
    MissingBackend,
    /// An option was the final token and has no value.
    #[error("{flag} requires a value")]
    MissingValue {
        /// Option missing its value.
        flag: &'static str,
    },
    /// The requested backend is not registered.
    #[error("backend {name} is not registered")]
    UnknownBackend {
        /// Requested backend name.
        name: String,
    },
    /// The `--flags` value is not a JSON object of scalar flags.
    #[error("--flags value is malformed: {reason}")]
    MalformedFlags {
        /// Parse or shape failure detail.
        reason: String,
    },
}

// ============================================================================
// SECTION: Parsed Arguments
// ============================================================================

/// Backend selection and flag overrides resolved from runner arguments.
#[derive(Clone)]
pub struct ParsedRunArgs {
    /// Registered backend name.
    pub name: String,
    /// Factory bound to the registry entry for `name`.
    pub factory: BackendFactory,
    /// Flag overrides for the run; empty when `--flags` is absent.
    pub flags: FlagMap,
}

impl ParsedRunArgs {
    /// Invokes the resolved factory.
    #[must_use]
    pub fn instantiate(&self) -> BackendHandle {
        (self.factory)()
    }

    /// Applies the flag overrides to `env`.
    pub fn apply_flags(&self, env: &FlagEnvironment) {
        env.set_flags(&self.flags);
    }
}

impl fmt::Debug for ParsedRunArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedRunArgs")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Resolves `--backend` and `--flags` from raw runner arguments.
///
/// Returns `Ok(None)` when neither option is present.
///
/// # Errors
///
/// Returns [`RunArgsError`] when `--flags` lacks `--backend`, an option lacks
/// its value, the backend is not registered, or the flags value is not a JSON
/// object of scalars.
pub fn parse_run_args<S: AsRef<str>>(
    args: &[S],
    registry: &BackendRegistry,
) -> Result<Option<ParsedRunArgs>, RunArgsError> {
    let Some(backend_index) = position_of(args, BACKEND_ARG) else {
        if position_of(args, FLAGS_ARG).is_some() {
            return Err(RunArgsError::MissingBackend);
        }
        return Ok(None);
    };
    let name = value_after(args, backend_index, BACKEND_ARG)?;
    let Some(factory) = registry.lookup(name) else {
        return Err(RunArgsError::UnknownBackend {
            name: name.to_string(),
        });
    };

    let flags = match position_of(args, FLAGS_ARG) {
        Some(flags_index) => parse_flag_object(value_after(args, flags_index, FLAGS_ARG)?)?,
        None => FlagMap::new(),
    };

    debug!(backend = name, overrides = flags.len(), "resolved runner arguments");
    Ok(Some(ParsedRunArgs {
        name: name.to_string(),
        factory,
        flags,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the index of the first token equal to `option`.
fn position_of<S: AsRef<str>>(args: &[S], option: &str) -> Option<usize> {
    args.iter().position(|token| token.as_ref() == option)
}

/// Returns the token following the option at `index`.
fn value_after<'a, S: AsRef<str>>(
    args: &'a [S],
    index: usize,
    option: &'static str,
) -> Result<&'a str, RunArgsError> {
    args.get(index + 1).map(|token| token.as_ref()).ok_or(RunArgsError::MissingValue {
        flag: option,
    })
}

/// Parses a JSON object of scalar flags, as carried by `--flags`.
///
/// # Errors
///
/// Returns [`RunArgsError::MalformedFlags`] when `raw` is not valid JSON, is
/// not an object, or holds a non-scalar member.
pub fn parse_flag_object(raw: &str) -> Result<FlagMap, RunArgsError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| RunArgsError::MalformedFlags {
        reason: err.to_string(),
    })?;
    let Value::Object(members) = value else {
        return Err(RunArgsError::MalformedFlags {
            reason: "expected a JSON object".to_string(),
        });
    };
    let mut flags = FlagMap::new();
    for (name, member) in &members {
        let Some(flag) = FlagValue::from_json(member) else {
            return Err(RunArgsError::MalformedFlags {
                reason: format!("flag {name} must be a boolean, number, or string"),
            });
        };
        flags.insert(name.clone(), flag);
    }
    Ok(flags)
}
