// crates/backend-harness-core/src/flags.rs
// ============================================================================
// Module: Flag Values
// Description: Typed flag values shared by the environment and constraints.
// Purpose: Give flags a strict, serializable scalar representation.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Flags are boolean, numeric, or string scalars. [`FlagValue`] deserializes
//! from an untagged scalar so override blobs and TOML tables map onto it
//! directly, and serializes through [`FlagValue::to_json`], which writes whole
//! numbers as JSON integers.
//! Invariants:
//! - Equality is strict: `Bool(true)` never equals `String("true")`.
//! - Numbers compare with IEEE semantics, so `NaN` is never equal to itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

// ============================================================================
// SECTION: Flag Value
// ============================================================================

/// Mapping from flag name to value.
pub type FlagMap = BTreeMap<String, FlagValue>;

/// A typed environment flag value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric flag.
    Number(f64),
    /// String flag.
    String(String),
}

impl FlagValue {
    /// Converts a JSON scalar into a flag value.
    ///
    /// Returns `None` for `null`, arrays, objects, and numbers that do not fit
    /// an `f64`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::String(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts the flag value into its JSON form.
    ///
    /// Whole numbers within the exactly representable integer range become
    /// JSON integers; non-finite numbers become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => number_to_json(*number),
            Self::String(text) => Value::String(text.clone()),
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Number(_) | Self::String(_) => None,
        }
    }

    /// Returns the numeric payload, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Bool(_) | Self::String(_) => None,
        }
    }

}

impl Serialize for FlagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::String(text) => f.write_str(text),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Encodes a numeric flag, preferring an integer form for whole numbers.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Whole numbers within +/-2^53 convert to i64 exactly."
)]
fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() <= MAX_EXACT_INTEGER {
        return Value::from(number as i64);
    }
    serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number)
}
