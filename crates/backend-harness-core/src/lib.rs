// crates/backend-harness-core/src/lib.rs
// ============================================================================
// Module: Backend Harness Core
// Description: Flag environment, constraint matching, and gated group registration.
// Purpose: Decide which test groups run against the live flag environment.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `backend-harness-core` owns the flag side of the test harness: typed flag
//! values, the [`FlagSource`] accessor consumed by the matcher, a reference
//! [`FlagEnvironment`] with lazy flag evaluation, and the constraint predicate
//! [`satisfies`] that gates [`GroupRegistrar::describe_with_flags`].
//! Invariants:
//! - Constraint evaluation never mutates the environment it reads.
//! - Flag equality is strict: variant and payload must both match.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod constraints;
pub mod environment;
pub mod flags;
pub mod groups;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use constraints::ConstraintSet;
pub use constraints::satisfies;
pub use environment::EnvironmentError;
pub use environment::FlagEnvironment;
pub use environment::FlagEvaluator;
pub use environment::FlagSource;
pub use environment::parse_flag_assignments;
pub use flags::FlagMap;
pub use flags::FlagValue;
pub use groups::GroupBuilder;
pub use groups::GroupOutcome;
pub use groups::GroupRegistrar;
pub use groups::RegisteredGroup;
pub use groups::TestCase;
