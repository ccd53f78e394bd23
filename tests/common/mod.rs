//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// The three-person family used throughout: @I1@ (You) is the child of @I2@ and @I3@ in @F1@.
#[allow(dead_code)]
pub const SCENARIO_A: [&str; 16] = [
    "0 @I1@ INDI",
    "1 NAME You",
    "1 SEX M",
    "1 FAMC @F1@",
    "0 @I2@ INDI",
    "1 NAME Father",
    "1 SEX M",
    "1 FAMS @F1@",
    "0 @I3@ INDI",
    "1 NAME Mother",
    "1 SEX F",
    "1 FAMS @F1@",
    "0 @F1@ FAM",
    "1 HUSB @I2@",
    "1 WIFE @I3@",
    "1 CHIL @I1@",
];

/// Writes `lines` into `<temp_dir>/family.ged` and returns the path.
#[allow(dead_code)]
pub fn write_family_file(temp_dir: &TempDir, lines: &[&str]) -> PathBuf {
    let path = temp_dir.path().join("family.ged");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}
