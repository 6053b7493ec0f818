// crates/backend-harness-registry/src/registry.rs
// ============================================================================
// Module: Backend Registry
// Description: Registry of named backend factories.
// Purpose: Resolve backend names to factories for test runs.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! The backend registry maps unique backend names to factories and an
//! optional priority used when no backend is requested explicitly. It is an
//! explicit object rather than ambient global state, so each test can build
//! an isolated registry.
//! Invariants:
//! - Backend names are non-empty and unique within the registry.
//! - Lookups return a clone of the stored factory; later removal does not
//!   invalidate factories already handed out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

use crate::backend::BackendFactory;
use crate::backend::BackendHandle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Priority assigned by [`BackendRegistry::register`].
pub const DEFAULT_BACKEND_PRIORITY: i32 = 1;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Backend registry errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Backend names must be non-empty.
    #[error("backend name must be non-empty")]
    InvalidName,
    /// A backend with the same name already exists.
    #[error("backend already registered: {name}")]
    AlreadyRegistered {
        /// Conflicting backend name.
        name: String,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Stored registry entry.
struct RegistryEntry {
    /// Factory producing the backend instance.
    factory: BackendFactory,
    /// Selection priority; higher wins.
    priority: i32,
}

/// Registry of named backend factories.
///
/// # Invariants
/// - Backend names are unique within the registry.
/// - All methods take `&self`; concurrent mutation is serialized by a lock.
#[derive(Default)]
pub struct BackendRegistry {
    /// Entries keyed by backend name.
    entries: RwLock<BTreeMap<String, RegistryEntry>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers a backend factory at [`DEFAULT_BACKEND_PRIORITY`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the name is empty or already registered.
    pub fn register(
        &self,
        name: impl Into<String>,
        factory: BackendFactory,
    ) -> Result<(), RegistryError> {
        self.register_with_priority(name, factory, DEFAULT_BACKEND_PRIORITY)
    }

    /// Registers a backend factory with an explicit priority.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the name is empty or already registered.
    pub fn register_with_priority(
        &self,
        name: impl Into<String>,
        factory: BackendFactory,
        priority: i32,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered {
                name,
            });
        }
        debug!(backend = %name, priority, "registered backend");
        entries.insert(
            name,
            RegistryEntry {
                factory,
                priority,
            },
        );
        Ok(())
    }

    /// Removes a backend. Returns true when an entry was removed.
    pub fn remove(&self, name: &str) -> bool {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(name).is_some()
    }

    /// Returns the factory registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<BackendFactory> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| Arc::clone(&entry.factory))
    }

    /// Invokes the factory registered under `name`.
    #[must_use]
    pub fn instantiate(&self, name: &str) -> Option<BackendHandle> {
        self.lookup(name).map(|factory| factory())
    }

    /// Returns true when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    /// Returns registered names in priority order, highest first.
    ///
    /// Equal priorities are ordered by name.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut ranked: Vec<(&String, i32)> =
            entries.iter().map(|(name, entry)| (name, entry.priority)).collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        ranked.into_iter().map(|(name, _)| name.clone()).collect()
    }

    /// Returns the highest-priority backend name, if any.
    #[must_use]
    pub fn best_backend(&self) -> Option<String> {
        self.names().into_iter().next()
    }
}
