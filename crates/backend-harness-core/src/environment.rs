// crates/backend-harness-core/src/environment.rs
// ============================================================================
// Module: Flag Environment
// Description: Read accessor and reference store for environment flags.
// Purpose: Provide lazily evaluated, overridable flags for test runs.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! [`FlagSource`] is the read-only accessor consumed by constraint matching.
//! [`FlagEnvironment`] is the reference implementation: flags are registered
//! with an evaluator that computes their default on first access, and test
//! runs can override values in bulk via [`FlagEnvironment::set_flags`].
//! Invariants:
//! - An evaluator runs at most once per flag until [`FlagEnvironment::reset`].
//! - Unknown flags read as `None`; the store never invents defaults.
//! - Lock poisoning is recovered; reads never panic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::flags::FlagMap;
use crate::flags::FlagValue;

// ============================================================================
// SECTION: Accessor
// ============================================================================

/// Read-only access to the live flag values of an environment.
pub trait FlagSource: Send + Sync {
    /// Returns the current value of `name`, or `None` when the flag is unknown.
    fn get(&self, name: &str) -> Option<FlagValue>;
}

impl FlagSource for FlagMap {
    fn get(&self, name: &str) -> Option<FlagValue> {
        BTreeMap::get(self, name).cloned()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Flag environment errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    /// The flag was set before being registered.
    #[error("cannot set flag {name}: flag has not been registered")]
    UnregisteredFlag {
        /// Flag name.
        name: String,
    },
    /// A `NAME:VALUE` assignment segment could not be parsed.
    #[error("malformed flag assignment: {segment}")]
    MalformedAssignment {
        /// Offending segment.
        segment: String,
    },
}

// ============================================================================
// SECTION: Flag Environment
// ============================================================================

/// Lazily evaluated default for a registered flag.
pub type FlagEvaluator = Arc<dyn Fn() -> FlagValue + Send + Sync>;

/// Process-wide flag environment used by production wiring.
static PROCESS_ENVIRONMENT: FlagEnvironment = FlagEnvironment::new();

/// Flag store with lazy default evaluation and bulk overrides.
///
/// # Invariants
/// - `values` holds only materialized flags; registration alone stores nothing.
/// - Evaluators run outside of any lock so they may read other flags.
pub struct FlagEnvironment {
    /// Registered evaluators keyed by flag name.
    evaluators: RwLock<BTreeMap<String, FlagEvaluator>>,
    /// Materialized flag values keyed by flag name.
    values: RwLock<FlagMap>,
}

impl FlagEnvironment {
    /// Creates an empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            evaluators: RwLock::new(BTreeMap::new()),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the process-wide environment.
    ///
    /// Library entry point for suites that share one environment across
    /// groups; tools that seed their own flags should use [`Self::new`].
    #[must_use]
    pub fn process() -> &'static Self {
        &PROCESS_ENVIRONMENT
    }

    /// Registers a flag whose default is computed on first access.
    ///
    /// Re-registering a flag replaces its evaluator; an already materialized
    /// value is kept.
    pub fn register_flag(
        &self,
        name: impl Into<String>,
        evaluator: impl Fn() -> FlagValue + Send + Sync + 'static,
    ) {
        let name = name.into();
        let mut evaluators = self.evaluators.write().unwrap_or_else(PoisonError::into_inner);
        if evaluators.insert(name.clone(), Arc::new(evaluator)).is_some() {
            warn!(flag = %name, "flag registered twice; overriding evaluator");
        }
    }

    /// Returns true when the flag has a registered evaluator.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.evaluators.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Sets a registered flag.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::UnregisteredFlag`] when `name` was never registered.
    pub fn set(&self, name: &str, value: FlagValue) -> Result<(), EnvironmentError> {
        if !self.is_registered(name) {
            return Err(EnvironmentError::UnregisteredFlag {
                name: name.to_string(),
            });
        }
        self.values.write().unwrap_or_else(PoisonError::into_inner).insert(name.to_string(), value);
        Ok(())
    }

    /// Assigns every flag in `flags`, registered or not.
    pub fn set_flags(&self, flags: &FlagMap) {
        if flags.is_empty() {
            return;
        }
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        for (name, value) in flags {
            values.insert(name.clone(), value.clone());
        }
        debug!(count = flags.len(), "applied flag overrides");
    }

    /// Returns a snapshot of every materialized flag.
    #[must_use]
    pub fn flags(&self) -> FlagMap {
        self.values.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drops materialized values; registrations are kept.
    pub fn reset(&self) {
        self.values.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Evaluates and caches a registered flag.
    fn materialize(&self, name: &str) -> Option<FlagValue> {
        let evaluator = self
            .evaluators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        let computed = evaluator();
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        Some(values.entry(name.to_string()).or_insert(computed).clone())
    }
}

impl Default for FlagEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagSource for FlagEnvironment {
    fn get(&self, name: &str) -> Option<FlagValue> {
        let cached = self.values.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned();
        cached.or_else(|| self.materialize(name))
    }
}

// ============================================================================
// SECTION: Assignment Parsing
// ============================================================================

/// Parses a compact `NAME:VALUE,NAME:VALUE` override list.
///
/// `true`/`false` (any case) become booleans, finite numeric text becomes a
/// number, and anything else is kept as a string. Empty segments are skipped.
///
/// # Errors
///
/// Returns [`EnvironmentError::MalformedAssignment`] when a segment has no
/// `:` separator or an empty name.
pub fn parse_flag_assignments(input: &str) -> Result<FlagMap, EnvironmentError> {
    let mut flags = FlagMap::new();
    for segment in input.split(',').map(str::trim).filter(|segment| !segment.is_empty()) {
        let Some((name, raw)) = segment.split_once(':') else {
            return Err(EnvironmentError::MalformedAssignment {
                segment: segment.to_string(),
            });
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EnvironmentError::MalformedAssignment {
                segment: segment.to_string(),
            });
        }
        flags.insert(name.to_string(), parse_assignment_value(raw.trim()));
    }
    Ok(flags)
}

/// Interprets the value half of an assignment.
fn parse_assignment_value(raw: &str) -> FlagValue {
    if raw.eq_ignore_ascii_case("true") {
        return FlagValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return FlagValue::Bool(false);
    }
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => FlagValue::Number(number),
        _ => FlagValue::String(raw.to_string()),
    }
}
