//! Preview target selection.

use anyhow::Result;
use fracture_core::TargetSelection;
use fracture_executor::{Config, MachineExecutor, MockRunner};
use fracture_types::TestPlan;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

use super::load_plan;

/// Run the targets command.
pub fn run(path: &Path, seed: Option<u64>, json: bool) -> Result<()> {
    let plan = load_plan(path)?;
    let selection = select(&plan, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    println!(
        "Selected {} of {} hosts (blast radius {}%)",
        selection.len(),
        selection.population,
        selection.blast_radius
    );
    if selection.rounded_to_zero() {
        println!("  (blast radius rounds down to zero hosts for this population)");
    }
    for host in &selection.hosts {
        println!("  {}", host);
    }

    Ok(())
}

/// Select targets exactly as `attack` would with the same seed.
pub fn select(plan: &TestPlan, seed: Option<u64>) -> Result<TargetSelection> {
    let config = Config::default();
    let executor = match seed {
        Some(seed) => MachineExecutor::with_rng(
            plan,
            &config,
            MockRunner::new(),
            &mut StdRng::seed_from_u64(seed),
        )?,
        None => MachineExecutor::new(plan, &config, MockRunner::new())?,
    };
    Ok(executor.selection().clone())
}
