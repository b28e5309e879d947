//! Run an attack.

use anyhow::{Context, Result};
use fracture_core::{HostStatus, MachineEvent, MachineEventKind, RunStatus, TargetSelection};
use fracture_executor::{
    config::DEFAULT_CONFIG_FILE, Config, MachineExecutor, MockRunner, RunReport, Runner,
    SshRunner,
};
use fracture_types::TestPlan;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::load_plan;

/// Options for the attack command.
#[derive(Debug, Clone, Default)]
pub struct AttackOptions {
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Use the mock runner.
    pub mock: bool,
    /// Seed for target selection.
    pub seed: Option<u64>,
    /// Print the summary as JSON.
    pub json: bool,
}

/// Run the attack command.
pub async fn run(path: &Path, options: &AttackOptions) -> Result<RunReport> {
    let plan = load_plan(path)?;
    let config = load_config(options.config.as_deref())?;

    if options.mock {
        info!("using mock runner");
        execute(&plan, &config, MockRunner::new(), options).await
    } else {
        let runner = SshRunner::new(config.ssh.clone());
        execute(&plan, &config, runner, options).await
    }
}

/// Fail if any target did not pass. A run with no targets is not a failure.
pub fn ensure_success(report: &RunReport) -> Result<()> {
    let summary = &report.summary;
    if summary.status == RunStatus::NoTargets || summary.all_passed() {
        return Ok(());
    }
    anyhow::bail!(
        "attack {}: {} failed, {} unreachable, {} abandoned",
        summary.status,
        summary.failed().len(),
        summary.unreachable().len(),
        summary.abandoned.len()
    )
}

/// Load `explicit`, else `fracture.toml` if it exists, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(Config::default()),
    };
    Config::from_file(path).context("Failed to load configuration")
}

async fn execute<R: Runner>(
    plan: &TestPlan,
    config: &Config,
    runner: R,
    options: &AttackOptions,
) -> Result<RunReport> {
    let mut executor = match options.seed {
        Some(seed) => {
            MachineExecutor::with_rng(plan, config, runner, &mut StdRng::seed_from_u64(seed))?
        }
        None => MachineExecutor::new(plan, config, runner)?,
    };

    if !options.json {
        register_progress(&executor)?;
    }
    let selection = executor.selection().clone();

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("cannot listen for ctrl-c, attack can only end by itself");
            std::future::pending::<()>().await;
        }
    };
    let report = executor.execute_until(shutdown).await?;

    if options.json {
        print_json(&report)?;
    } else {
        print_summary(&selection, &report);
    }
    Ok(report)
}

fn register_progress<R: Runner>(executor: &MachineExecutor<R>) -> Result<()> {
    executor.register_hook(MachineEventKind::Start, |event| {
        if let MachineEvent::Start { plan_id, targets } = event {
            println!("Attacking {} targets (plan {})", targets.len(), plan_id);
        }
        Ok(())
    })?;

    for kind in [
        MachineEventKind::TargetPassed,
        MachineEventKind::TargetFailed,
        MachineEventKind::TargetUnreachable,
    ] {
        executor.register_hook(kind, |event| {
            if let Some(outcome) = event.host_outcome() {
                let mark = match outcome.status {
                    HostStatus::Passed => "ok",
                    HostStatus::Failed => "FAILED",
                    HostStatus::Unreachable => "UNREACHABLE",
                };
                match &outcome.message {
                    Some(message) => println!("  [{}] {}: {}", mark, outcome.host, message),
                    None => println!("  [{}] {}", mark, outcome.host),
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn print_summary(selection: &TargetSelection, report: &RunReport) {
    let summary = &report.summary;
    println!();
    println!("Attack {}", summary.status);
    println!(
        "  Targets:     {} of {} hosts ({}%)",
        selection.len(),
        selection.population,
        selection.blast_radius
    );
    println!("  Passed:      {}", summary.passed().len());
    println!("  Failed:      {}", summary.failed().len());
    println!("  Unreachable: {}", summary.unreachable().len());
    if !summary.abandoned.is_empty() {
        println!("  Abandoned:   {}", summary.abandoned.join(", "));
    }
    if selection.rounded_to_zero() {
        println!();
        println!("Note: blast radius rounds down to zero hosts for this population");
    }
    for failure in &report.hook_failures {
        println!("  Hook error:  {}", failure);
    }
}

fn print_json(report: &RunReport) -> Result<()> {
    let hook_failures: Vec<String> = report
        .hook_failures
        .iter()
        .flat_map(|f| {
            f.failures
                .iter()
                .map(move |h| format!("{} {}: {}", f.event, h.hook, h.message))
        })
        .collect();
    let value = serde_json::json!({
        "summary": report.summary,
        "hook_failures": hook_failures,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;
    use tempfile::tempdir;

    fn mock(seed: u64) -> AttackOptions {
        AttackOptions {
            mock: true,
            seed: Some(seed),
            ..AttackOptions::default()
        }
    }

    #[tokio::test]
    async fn mock_attack_passes_every_target() {
        let report = run(&fixture("valid/testplan1.yaml"), &mock(3)).await.unwrap();

        assert_eq!(report.summary.status, RunStatus::Completed);
        assert_eq!(report.summary.passed().len(), 3);
        assert!(report.is_clean());
        ensure_success(&report).unwrap();
    }

    #[tokio::test]
    async fn mock_attack_targets_match_preview() {
        let path = fixture("valid/testplan1.json");
        let report = run(&path, &mock(11)).await.unwrap();

        let plan = load_plan(&path).unwrap();
        let preview = crate::commands::targets::select(&plan, Some(11)).unwrap();
        assert_eq!(report.summary.targets, preview.hosts);
    }

    #[tokio::test]
    async fn json_output_skips_progress_hooks() {
        let options = AttackOptions {
            json: true,
            ..mock(5)
        };
        let report = run(&fixture("valid/testplan1.json"), &options).await.unwrap();
        assert!(report.summary.all_passed());
    }

    #[tokio::test]
    async fn explicit_config_is_used() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("fracture.toml");
        std::fs::write(&config_path, "[executor]\nconcurrency = 1\n").unwrap();

        let options = AttackOptions {
            config: Some(config_path),
            ..mock(2)
        };
        run(&fixture("valid/testplan1.yaml"), &options).await.unwrap();
    }

    #[tokio::test]
    async fn bad_config_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("fracture.toml");
        std::fs::write(&config_path, "[executor]\nconcurrency = \"all\"\n").unwrap();

        let options = AttackOptions {
            config: Some(config_path),
            ..mock(2)
        };
        assert!(run(&fixture("valid/testplan1.yaml"), &options).await.is_err());
    }

    #[test]
    fn no_targets_is_not_a_failure() {
        let mut summary =
            fracture_core::RunSummary::new(fracture_types::TestPlanId::random(), Vec::new());
        summary.finish(RunStatus::NoTargets);
        let report = RunReport {
            summary,
            hook_failures: Vec::new(),
        };
        ensure_success(&report).unwrap();
    }

    #[test]
    fn failed_hosts_are_a_failure() {
        let mut summary = fracture_core::RunSummary::new(
            fracture_types::TestPlanId::random(),
            vec!["a".into(), "b".into()],
        );
        summary.record(fracture_core::HostOutcome::passed("a", Vec::new()));
        summary.record(fracture_core::HostOutcome::failed("b", Vec::new(), "pip failed"));
        summary.finish(RunStatus::Completed);
        let report = RunReport {
            summary,
            hook_failures: Vec::new(),
        };

        let err = ensure_success(&report).unwrap_err();
        assert!(err.to_string().contains("1 failed"));
    }
}
