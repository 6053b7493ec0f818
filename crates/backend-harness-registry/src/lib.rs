// crates/backend-harness-registry/src/lib.rs
// ============================================================================
// Module: Backend Harness Registry
// Description: Backend registry and runner argument resolution.
// Purpose: Select the backend and flag overrides for a test run.
// Dependencies: backend-harness-core, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! This crate holds the injectable [`BackendRegistry`] of named backend
//! factories and [`parse_run_args`], which resolves `--backend` and `--flags`
//! runner arguments against that registry.
//! Invariants:
//! - The registry is the single source of truth for factories; parsed
//!   arguments forward the registry's own factory.
//! - Resolution is a point-in-time lookup with no transactional guarantee.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod registry;
pub mod run_args;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::Backend;
pub use backend::BackendFactory;
pub use backend::BackendHandle;
pub use backend::TestKernelBackend;
pub use registry::BackendRegistry;
pub use registry::DEFAULT_BACKEND_PRIORITY;
pub use registry::RegistryError;
pub use run_args::BACKEND_ARG;
pub use run_args::FLAGS_ARG;
pub use run_args::ParsedRunArgs;
pub use run_args::RunArgsError;
pub use run_args::parse_flag_object;
pub use run_args::parse_run_args;
