// crates/backend-harness-registry/src/backend.rs
// ============================================================================
// Module: Backends
// Description: Backend trait, handle, and factory types.
// Purpose: Describe the pluggable compute engines selectable per test run.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A backend is an opaque compute engine. The harness only creates backends
//! through factories and compares instances by identity; it never drives
//! their computation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

// ============================================================================
// SECTION: Backend Types
// ============================================================================

/// Pluggable compute backend.
pub trait Backend: Send + Sync {
    /// Returns a stable label describing the backend implementation.
    fn kind(&self) -> &str;
}

/// Shared handle to a backend instance.
pub type BackendHandle = Arc<dyn Backend>;

/// Zero-argument backend factory.
pub type BackendFactory = Arc<dyn Fn() -> BackendHandle + Send + Sync>;

// ============================================================================
// SECTION: Test Backend
// ============================================================================

/// Inert backend for wiring registries in tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestKernelBackend {
    /// Label returned by [`Backend::kind`].
    label: String,
}

impl TestKernelBackend {
    /// Creates a test backend reporting `label` as its kind.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns a factory that yields one shared instance labelled `label`.
    #[must_use]
    pub fn shared_factory(label: impl Into<String>) -> BackendFactory {
        let instance: BackendHandle = Arc::new(Self::new(label));
        Arc::new(move || Arc::clone(&instance))
    }
}

impl Backend for TestKernelBackend {
    fn kind(&self) -> &str {
        if self.label.is_empty() { "test" } else { &self.label }
    }
}
