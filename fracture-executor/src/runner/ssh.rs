//! SSH runner.
//!
//! Uses `tokio::process::Command` to shell out to `ssh`. Authentication is
//! left to the local SSH setup (agent, keys, `~/.ssh/config`); the runner
//! always runs in batch mode and never prompts.
//!
//! Children are killed when their future is dropped, so an aborted host
//! task stops provisioning the remote host.

use super::{RunRequest, Runner, RunnerError};
use crate::config::SshRunnerConfig;
use async_trait::async_trait;
use fracture_core::{HostOutcome, ProvisionStep, StepResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Exit status `ssh` uses for its own connection errors.
const SSH_CONNECTION_ERROR: i32 = 255;

/// Runner that provisions hosts over SSH.
#[derive(Debug)]
pub struct SshRunner {
    config: SshRunnerConfig,
    prepared: AtomicBool,
}

impl SshRunner {
    /// Create a runner with the given settings.
    pub fn new(config: SshRunnerConfig) -> Self {
        Self {
            config,
            prepared: AtomicBool::new(false),
        }
    }

    /// Arguments passed to `ssh` to run `command` on `host`.
    pub fn ssh_args(&self, host: &str, request: &RunRequest, command: &str) -> Vec<String> {
        let strict = if self.config.strict_host_key_checking {
            "yes"
        } else {
            "no"
        };
        let destination = match &request.remote_user {
            Some(user) => format!("{}@{}", user, host),
            None => host.to_string(),
        };
        vec![
            "-o".into(),
            format!("StrictHostKeyChecking={}", strict),
            "-o".into(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "-o".into(),
            "BatchMode=yes".into(),
            "-p".into(),
            request.port.to_string(),
            destination,
            command.to_string(),
        ]
    }

    /// Execute a command on `host` via SSH.
    ///
    /// Returns the raw result including exit code. Does NOT fail on non-zero
    /// exit; only a failure to start `ssh` is an error.
    async fn exec(
        &self,
        host: &str,
        request: &RunRequest,
        step: &ProvisionStep,
        command: &str,
    ) -> Result<StepResult, RunnerError> {
        debug!(host = %host, step = %step, "running provisioning step");
        let output = tokio::process::Command::new(&self.config.program)
            .args(self.ssh_args(host, request, command))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        Ok(StepResult {
            step: step.name().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[async_trait]
impl Runner for SshRunner {
    async fn prepare(&self, _request: &RunRequest) -> Result<(), RunnerError> {
        // `ssh -V` only checks that the client is installed.
        tokio::process::Command::new(&self.config.program)
            .arg("-V")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;
        self.prepared.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn run_host(&self, host: &str, request: &RunRequest) -> Result<HostOutcome, RunnerError> {
        if !self.prepared.load(Ordering::SeqCst) {
            return Err(RunnerError::NotPrepared);
        }

        let mut workdir = String::new();
        let mut interpreter_path = String::new();
        let mut results = Vec::with_capacity(request.steps.len());

        for step in &request.steps {
            let command = step.command(&workdir, &interpreter_path);
            let result = self.exec(host, request, step, &command).await?;

            if result.exit_code == SSH_CONNECTION_ERROR {
                return Ok(HostOutcome::unreachable(host, result.stderr.trim()));
            }
            if !result.success() {
                let message = format!(
                    "{} exited with {}: {}",
                    step,
                    result.exit_code,
                    result.stderr.trim()
                );
                results.push(result);
                return Ok(HostOutcome::failed(host, results, &message));
            }

            match step {
                ProvisionStep::CheckWorkingDirectory => workdir = result.stdout.trim().to_string(),
                ProvisionStep::CheckInterpreter { .. } => {
                    interpreter_path = result.stdout.trim().to_string()
                }
                ProvisionStep::InstallPackage { .. } => {}
            }
            results.push(result);
        }

        Ok(HostOutcome::passed(host, results))
    }

    async fn cleanup(&self) -> Result<(), RunnerError> {
        self.prepared.store(false, Ordering::SeqCst);
        Ok(())
    }
}
