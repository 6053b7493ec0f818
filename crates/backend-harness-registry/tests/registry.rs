// crates/backend-harness-registry/tests/registry.rs
// ============================================================================
// Module: Backend Registry Tests
// Description: Tests for backend registration, removal, and lookup.
// Purpose: Ensure the registry is the single source of truth for factories.
// Dependencies: backend-harness-registry
// ============================================================================

//! ## Overview
//! Covers name validation, duplicate detection, priority ordering, and the
//! identity of instances produced through looked-up factories.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use backend_harness_registry::Backend;
use backend_harness_registry::BackendHandle;
use backend_harness_registry::BackendRegistry;
use backend_harness_registry::RegistryError;
use backend_harness_registry::TestKernelBackend;

#[test]
fn register_and_lookup_round_trip_identity() {
    let registry = BackendRegistry::new();
    let backend: BackendHandle = Arc::new(TestKernelBackend::new("cpu"));
    let shared = Arc::clone(&backend);
    registry.register("cpu", Arc::new(move || Arc::clone(&shared))).unwrap();

    let factory = registry.lookup("cpu").unwrap();
    assert!(Arc::ptr_eq(&factory(), &backend));
    assert!(Arc::ptr_eq(&registry.instantiate("cpu").unwrap(), &backend));
    assert_eq!(backend.kind(), "cpu");
}

#[test]
fn empty_name_is_rejected() {
    let registry = BackendRegistry::new();
    let err = registry.register("", TestKernelBackend::shared_factory("x")).unwrap_err();
    assert_eq!(err, RegistryError::InvalidName);
    assert!(registry.names().is_empty());
}

#[test]
fn duplicate_name_is_rejected() {
    let registry = BackendRegistry::new();
    registry.register("webgl", TestKernelBackend::shared_factory("webgl")).unwrap();
    let err = registry.register("webgl", TestKernelBackend::shared_factory("other")).unwrap_err();
    assert_eq!(
        err,
        RegistryError::AlreadyRegistered {
            name: "webgl".to_string()
        }
    );
    assert_eq!(registry.instantiate("webgl").unwrap().kind(), "webgl");
}

#[test]
fn remove_reports_presence() {
    let registry = BackendRegistry::new();
    registry.register("cpu", TestKernelBackend::shared_factory("cpu")).unwrap();
    assert!(registry.contains("cpu"));
    assert!(registry.remove("cpu"));
    assert!(!registry.remove("cpu"));
    assert!(registry.lookup("cpu").is_none());
}

#[test]
fn looked_up_factory_survives_removal() {
    let registry = BackendRegistry::new();
    registry.register("cpu", TestKernelBackend::shared_factory("cpu")).unwrap();
    let factory = registry.lookup("cpu").unwrap();
    registry.remove("cpu");
    assert_eq!(factory().kind(), "cpu");
}

#[test]
fn names_follow_priority_then_name() {
    let registry = BackendRegistry::new();
    registry.register("cpu", TestKernelBackend::shared_factory("cpu")).unwrap();
    registry
        .register_with_priority("webgl", TestKernelBackend::shared_factory("webgl"), 2)
        .unwrap();
    registry
        .register_with_priority("wasm", TestKernelBackend::shared_factory("wasm"), 2)
        .unwrap();
    assert_eq!(registry.names(), vec!["wasm", "webgl", "cpu"]);
    assert_eq!(registry.best_backend().as_deref(), Some("wasm"));
}

#[test]
fn best_backend_of_empty_registry_is_none() {
    assert!(BackendRegistry::default().best_backend().is_none());
}

#[test]
fn test_kernel_backend_defaults_to_test_kind() {
    assert_eq!(TestKernelBackend::default().kind(), "test");
}
