//! Common utilities for integration tests
#![allow(dead_code)]

pub mod fake_engine;
pub mod fixtures;

// Re-export commonly used items
pub use fake_engine::FakeEngine;
pub use fixtures::{dune_report, dune_scores, dune_table, render_report, strings, workspace_count};

/// Route library logs to the test harness (RUST_LOG=decorana_rs=debug)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
