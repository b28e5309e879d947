//! CLI command implementations.

pub mod attack;
pub mod export;
pub mod schema;
pub mod targets;
pub mod validate;
pub mod verification;

use anyhow::{Context, Result};
use fracture_types::TestPlan;
use std::path::Path;

/// Load and validate a test plan document.
pub fn load_plan(path: &Path) -> Result<TestPlan> {
    TestPlan::load_file(path)
        .with_context(|| format!("Failed to load test plan {}", path.display()))
}

/// Path of a bundled fixture plan.
#[cfg(test)]
pub fn fixture(relative: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fracture-types/resources/testplans")
        .join(relative)
}
