//! Print, write or check the test plan JSON Schema.

use anyhow::{Context, Result};
use fracture_types::{schema, TestPlan};
use std::path::Path;

/// Run the schema command: print the schema, or write it to `output`.
pub fn run(output: Option<&Path>) -> Result<()> {
    let text = render()?;
    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write schema to {}", path.display()))?;
            println!("Wrote schema to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Check a published schema file against the current model.
pub fn check(published: &Path) -> Result<()> {
    let text = std::fs::read_to_string(published)
        .with_context(|| format!("Failed to read {}", published.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", published.display()))?;

    schema::check_consistency(&value)
        .with_context(|| format!("{} is out of date", published.display()))?;

    println!("Schema {} is up to date", published.display());
    Ok(())
}

/// Pretty-printed schema with a trailing newline.
fn render() -> Result<String> {
    let schema = TestPlan::schema()?;
    Ok(format!("{}\n", serde_json::to_string_pretty(&schema)?))
}
