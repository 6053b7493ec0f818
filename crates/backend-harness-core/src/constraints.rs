// crates/backend-harness-core/src/constraints.rs
// ============================================================================
// Module: Flag Constraints
// Description: Constraint sets and the environment satisfaction predicate.
// Purpose: Decide whether the live environment matches required flag values.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! A [`ConstraintSet`] maps flag names to the values a test group requires.
//! [`satisfies`] reads each flag from a [`FlagSource`] and holds only when
//! every live value strictly equals its expected value.
//! Invariants:
//! - The empty set is satisfied by every environment.
//! - Unknown flags never satisfy a constraint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::environment::FlagSource;
use crate::flags::FlagValue;

// ============================================================================
// SECTION: Constraint Set
// ============================================================================

/// Required flag values for a test group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    /// Expected values keyed by flag name.
    entries: BTreeMap<String, FlagValue>,
}

impl ConstraintSet {
    /// Creates an empty constraint set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the set with an additional constraint.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, expected: impl Into<FlagValue>) -> Self {
        self.insert(name, expected);
        self
    }

    /// Adds or replaces a constraint.
    pub fn insert(&mut self, name: impl Into<String>, expected: impl Into<FlagValue>) {
        self.entries.insert(name.into(), expected.into());
    }

    /// Builds a constraint set from a JSON object of scalars.
    ///
    /// Returns `None` when `value` is not an object or holds a non-scalar member.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        map.iter()
            .map(|(name, raw)| FlagValue::from_json(raw).map(|expected| (name.clone(), expected)))
            .collect()
    }

    /// Returns true when no constraints are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates constraints in flag-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.entries.iter().map(|(name, expected)| (name.as_str(), expected))
    }
}

impl<K: Into<String>, V: Into<FlagValue>> FromIterator<(K, V)> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect(),
        }
    }
}

// ============================================================================
// SECTION: Matcher
// ============================================================================

/// Returns true when every constraint matches the environment's live value.
#[must_use]
pub fn satisfies(env: &(impl FlagSource + ?Sized), constraints: &ConstraintSet) -> bool {
    for (name, expected) in constraints.iter() {
        if env.get(name).as_ref() != Some(expected) {
            trace!(flag = name, expected = %expected, "constraint not satisfied");
            return false;
        }
    }
    true
}
