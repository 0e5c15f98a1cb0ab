//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mock_store;

/// Installs a `tracing` subscriber honoring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
