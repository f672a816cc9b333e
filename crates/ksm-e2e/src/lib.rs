//! End-to-end test utilities for Keeper notation resolution
//!
//! This crate provides a mock vault client and record fixtures for running
//! E2E tests of parsing, caching and resolution without a real vault.

pub mod fixtures;
pub mod mock_vault;

pub use fixtures::{sample_records, test_options, FILE_UID, RECORD_UID};
pub use mock_vault::MockVaultClient;

/// Initialize tracing for tests (ignored if already initialized)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ksm_notation=debug,ksm_secrets=debug,ksm_e2e=debug")
        .with_test_writer()
        .try_init();
}
