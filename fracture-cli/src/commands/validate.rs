//! Validate a test plan document.

use anyhow::{Context, Result};
use fracture_core::sample_count;
use fracture_types::{PlanError, TargetDefinition, TestPlan};
use std::path::Path;

use super::load_plan;

/// Run the validate command.
pub fn run(path: &Path) -> Result<()> {
    let plan = load_plan(path)?;
    let hosts = effective_population(&plan)?;

    let TargetDefinition::Machine(target) = plan.attack.get_target_config()?;
    let agents: Vec<&str> = plan
        .attack
        .agents
        .iter()
        .map(|a| a.agent_type.as_str())
        .collect();

    println!("Test plan is valid!");
    println!();
    println!("  ID:           {}", plan.id);
    if !plan.description.is_empty() {
        println!("  Description:  {}", plan.description);
    }
    println!("  Target type:  {}", plan.attack.target_type);
    println!(
        "  Hosts:        {} ({} hostnames, {} hostpatterns)",
        hosts,
        target.hostnames.len(),
        target.hostpatterns.len()
    );
    println!(
        "  Blast radius: {}% ({} targets)",
        target.blast_radius,
        sample_count(hosts, target.blast_radius)
    );
    println!("  Agents:       {}", agents.join(", "));
    println!("  Verification: {} checks", plan.verification.len());

    Ok(())
}

/// Size of the effective host population; expands every hostpattern.
pub fn effective_population(plan: &TestPlan) -> Result<usize> {
    let target = plan.attack.get_target_config()?;
    let hosts = target
        .effective_hosts()
        .context("Failed to expand hostpatterns")?;
    if hosts.is_empty() {
        return Err(PlanError::EmptyPopulation.into());
    }
    Ok(hosts.len())
}
