//! Configuration loading for the executor.
//!
//! Configuration is loaded from a TOML file (default: `fracture.toml`).
//! Every section and field is optional.

use fracture_core::ProvisionStep;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "fracture.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Executor configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// SSH runner configuration.
    #[serde(default)]
    pub ssh: SshRunnerConfig,
}

/// What to do when the blast radius selects no hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTargetPolicy {
    /// Run as a reported no-op: `on_start`, then `on_end` with no targets.
    #[default]
    Skip,
    /// Fail at prepare time.
    Fail,
}

/// Executor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Maximum number of hosts in flight (default: 16).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Overall run timeout in seconds, 0 disables it (default: 0).
    #[serde(default)]
    pub run_timeout_secs: u64,
    /// Behaviour when no host is selected (default: skip).
    #[serde(default)]
    pub empty_targets: EmptyTargetPolicy,
}

/// SSH runner configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshRunnerConfig {
    /// SSH client binary (default: `ssh` from `PATH`).
    #[serde(default = "default_program")]
    pub program: String,
    /// SSH connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Verify host keys (default: false).
    #[serde(default)]
    pub strict_host_key_checking: bool,
    /// Interpreter used to run agents (default: python3).
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Agent package installed on every target (default: fracture-agents).
    #[serde(default = "default_package")]
    pub package: String,
    /// Virtualenv directory, relative to the remote working directory.
    #[serde(default = "default_virtualenv")]
    pub virtualenv: String,
}

// Default value functions
fn default_concurrency() -> usize {
    16
}

fn default_program() -> String {
    "ssh".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_package() -> String {
    "fracture-agents".to_string()
}

fn default_virtualenv() -> String {
    "fracture_env".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            run_timeout_secs: 0,
            empty_targets: EmptyTargetPolicy::default(),
        }
    }
}

impl Default for SshRunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            connect_timeout_secs: default_connect_timeout_secs(),
            strict_host_key_checking: false,
            interpreter: default_interpreter(),
            package: default_package(),
            virtualenv: default_virtualenv(),
        }
    }
}

impl ExecutorConfig {
    /// The run timeout, if one is configured.
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Provisioning steps every target runs before an attack.
    pub fn provision_steps(&self) -> Vec<ProvisionStep> {
        ProvisionStep::sequence(&self.ssh.interpreter, &self.ssh.package, &self.ssh.virtualenv)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.executor.concurrency, 16);
        assert_eq!(config.executor.run_timeout(), None);
        assert_eq!(config.executor.empty_targets, EmptyTargetPolicy::Skip);
        assert_eq!(config.ssh.program, "ssh");
        assert_eq!(config.ssh.connect_timeout_secs, 30);
        assert!(!config.ssh.strict_host_key_checking);
        assert_eq!(config.ssh.interpreter, "python3");
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[executor]
concurrency = 4
run_timeout_secs = 600
empty_targets = "fail"

[ssh]
connect_timeout_secs = 10
strict_host_key_checking = true
package = "fracture-agents==0.3.1"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.executor.concurrency, 4);
        assert_eq!(config.executor.run_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.executor.empty_targets, EmptyTargetPolicy::Fail);
        assert_eq!(config.ssh.connect_timeout_secs, 10);
        assert!(config.ssh.strict_host_key_checking);
        assert_eq!(config.ssh.package, "fracture-agents==0.3.1");
        // Unset fields keep their defaults
        assert_eq!(config.ssh.virtualenv, "fracture_env");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.executor.concurrency, 16);
        assert_eq!(config.ssh.package, "fracture-agents");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[executor]\nempty_targets = \"retry\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn provision_steps_follow_ssh_section() {
        let mut config = Config::default();
        config.ssh.interpreter = "python3.12".into();
        let steps = config.provision_steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[1],
            ProvisionStep::CheckInterpreter {
                interpreter: "python3.12".into()
            }
        );
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fracture.toml");

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));

        std::fs::write(&path, "[executor]\nconcurrency = \"many\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("fracture.toml"));

        std::fs::write(&path, "[executor]\nconcurrency = 2\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().executor.concurrency, 2);
    }
}
