//! List the verification checks bound to a system state.

use anyhow::Result;
use fracture_types::{SystemState, Verification};
use std::path::Path;

use super::load_plan;

/// Run the verification command.
pub fn run(path: &Path, state: SystemState, json: bool) -> Result<()> {
    let plan = load_plan(path)?;
    let checks = plan.filter_verification_by_state(state);

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
        return Ok(());
    }

    if checks.is_empty() {
        println!("No verification checks run in {}", state);
        return Ok(());
    }

    println!("{} verification checks run in {}:", checks.len(), state);
    for check in checks {
        let detail = match check.get_verification_config()? {
            Verification::PythonModule(v) => v.path.display().to_string(),
            Verification::HttpRequest(v) => format!("{} {}", v.method, v.url),
        };
        println!("  {:<14} {}", check.verification_type, detail);
    }

    Ok(())
}
