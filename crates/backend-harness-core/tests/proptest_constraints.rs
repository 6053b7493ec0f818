//! Constraint matching property-based tests.
//!
//! ## Purpose
//! Checks the satisfaction predicate over generated flag environments.
//!
//! ## What is covered
//! - A constraint set built from the environment itself always holds.
//! - Flipping any boolean entry makes the set fail.
// crates/backend-harness-core/tests/proptest_constraints.rs
// ============================================================================
// Module: Constraint Property-Based Tests
// Description: Generated environments for the satisfaction predicate.
// Purpose: Ensure matching is exact for arbitrary flag maps.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use backend_harness_core::ConstraintSet;
use backend_harness_core::FlagMap;
use backend_harness_core::FlagValue;
use backend_harness_core::satisfies;
use proptest::prelude::*;

fn flag_value() -> impl Strategy<Value = FlagValue> {
    prop_oneof![
        any::<bool>().prop_map(FlagValue::Bool),
        (-1_000i32..1_000).prop_map(|number| FlagValue::Number(f64::from(number))),
        "[a-z]{0,8}".prop_map(FlagValue::String),
    ]
}

fn flag_map() -> impl Strategy<Value = FlagMap> {
    prop::collection::btree_map("[A-Z_]{1,12}", flag_value(), 0..8)
}

proptest! {
    #[test]
    fn environment_satisfies_its_own_snapshot(env in flag_map()) {
        let constraints: ConstraintSet = env.clone().into_iter().collect();
        prop_assert!(satisfies(&env, &constraints));
    }

    #[test]
    fn flipped_boolean_is_never_satisfied(env in flag_map(), flag in any::<bool>()) {
        let mut env = env;
        env.insert("PROBE".to_string(), FlagValue::Bool(flag));
        let constraints = ConstraintSet::new().with("PROBE", !flag);
        prop_assert!(!satisfies(&env, &constraints));
    }

    #[test]
    fn subset_of_environment_is_satisfied(env in flag_map(), keep in 0usize..8) {
        let constraints: ConstraintSet = env.clone().into_iter().take(keep).collect();
        prop_assert!(satisfies(&env, &constraints));
    }
}
