// crates/backend-harness-core/src/groups.rs
// ============================================================================
// Module: Gated Group Registration
// Description: Registers test groups only when flag constraints hold.
// Purpose: Let suites declare environment requirements next to their tests.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`GroupRegistrar::describe_with_flags`] evaluates a group's
//! [`ConstraintSet`] against the registrar's flag source. Satisfied groups run
//! their body against a [`GroupBuilder`] and are recorded with their cases;
//! unsatisfied groups are recorded as skipped and their body never runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tracing::debug;

use crate::constraints::ConstraintSet;
use crate::constraints::satisfies;
use crate::environment::FlagSource;

// ============================================================================
// SECTION: Test Cases
// ============================================================================

/// Boxed body of a registered test case.
type CaseBody = Box<dyn Fn() + Send + Sync>;

/// A named test case inside a registered group.
pub struct TestCase {
    /// Case name.
    name: String,
    /// Case body.
    body: CaseBody,
}

impl TestCase {
    /// Returns the case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the case body.
    pub fn run(&self) {
        (self.body)();
    }
}

/// Collects the cases of a group while its body runs.
#[derive(Default)]
pub struct GroupBuilder {
    /// Cases declared so far.
    cases: Vec<TestCase>,
}

impl GroupBuilder {
    /// Declares a test case.
    pub fn it(&mut self, name: impl Into<String>, body: impl Fn() + Send + Sync + 'static) {
        self.cases.push(TestCase {
            name: name.into(),
            body: Box::new(body),
        });
    }
}

/// A group whose constraints held at registration time.
pub struct RegisteredGroup {
    /// Group name.
    name: String,
    /// Declared cases in declaration order.
    cases: Vec<TestCase>,
}

impl RegisteredGroup {
    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared cases.
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

// ============================================================================
// SECTION: Registrar
// ============================================================================

/// Result of a gated registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Constraints held and the group was registered.
    Registered,
    /// Constraints failed and the group was skipped.
    Skipped,
}

/// Registers groups against a flag source.
pub struct GroupRegistrar {
    /// Environment consulted for every group.
    env: Arc<dyn FlagSource>,
    /// Groups registered so far.
    registered: Vec<RegisteredGroup>,
    /// Names of skipped groups.
    skipped: Vec<String>,
}

impl GroupRegistrar {
    /// Creates a registrar reading from `env`.
    #[must_use]
    pub fn new(env: Arc<dyn FlagSource>) -> Self {
        Self {
            env,
            registered: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Registers the group built by `body` when `constraints` hold.
    pub fn describe_with_flags(
        &mut self,
        name: impl Into<String>,
        constraints: &ConstraintSet,
        body: impl FnOnce(&mut GroupBuilder),
    ) -> GroupOutcome {
        let name = name.into();
        if !satisfies(self.env.as_ref(), constraints) {
            debug!(group = %name, "skipping group; constraints not satisfied");
            self.skipped.push(name);
            return GroupOutcome::Skipped;
        }
        let mut builder = GroupBuilder::default();
        body(&mut builder);
        debug!(group = %name, cases = builder.cases.len(), "registered group");
        self.registered.push(RegisteredGroup {
            name,
            cases: builder.cases,
        });
        GroupOutcome::Registered
    }

    /// Returns the registered groups in registration order.
    #[must_use]
    pub fn registered(&self) -> &[RegisteredGroup] {
        &self.registered
    }

    /// Returns the names of skipped groups in registration order.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}
