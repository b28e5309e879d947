//! Export a test plan as JSON or YAML.

use anyhow::{Context, Result};
use fracture_types::DocumentFormat;
use std::path::Path;

use super::load_plan;

/// Run the export command.
pub fn run(path: &Path, output: &Path, format: Option<DocumentFormat>) -> Result<()> {
    let plan = load_plan(path)?;
    let format = format.unwrap_or_else(|| DocumentFormat::from_path(output));

    plan.export_to_file(output, format)
        .with_context(|| format!("Failed to export plan to {}", output.display()))?;

    println!("Exported plan {} to {} ({})", plan.id, output.display(), format);
    Ok(())
}
