//! Test infrastructure for the output log
//!
//! Provides fixture loading, a log builder for fixture events, seeded
//! stochastic variations and tracing setup.

#![allow(dead_code)]

mod generators;
mod harness;
mod loader;

pub use generators::Gen;
pub use harness::{build_log, run_test, run_with_variations, to_output, AttrT, Vars};
pub use loader::{load_fixtures_by_name, TestCase};

/// Routes `tracing` output to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Variations per fixture: `AUTOESC_TEST_COUNT`, else a Poisson draw.
pub fn variation_count(gen: &mut Gen) -> usize {
    std::env::var("AUTOESC_TEST_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| gen.poisson(3.0).max(1))
}
