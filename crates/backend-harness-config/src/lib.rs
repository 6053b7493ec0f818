// crates/backend-harness-config/src/lib.rs
// ============================================================================
// Module: Backend Harness Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for backend-harness.toml semantics.
// Dependencies: backend-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! `backend-harness-config` defines the configuration model for the harness:
//! the default backend, default flag values, the backends a dry run should
//! register, and the log level. Loading is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
