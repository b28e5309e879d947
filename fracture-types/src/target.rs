//! Target definitions: which hosts an attack may hit, and how many of them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{PatternError, PlanError};
use crate::hostpattern;

/// Discriminator selecting a [`TargetDefinition`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Virtual machines or bare metal reached over SSH.
    Machine,
}

impl TargetType {
    /// The document name of this target type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Machine => "machine",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved target definition, one variant per [`TargetType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDefinition {
    /// Machine target.
    Machine(MachineTargetDefinition),
}

impl TargetDefinition {
    /// Resolve a raw `target_config` mapping for the given target type.
    ///
    /// This is the type → constructor lookup; the match is exhaustive so a
    /// new [`TargetType`] cannot be added without a constructor.
    pub fn resolve(target_type: TargetType, config: &serde_json::Value) -> Result<Self, PlanError> {
        match target_type {
            TargetType::Machine => {
                let definition: MachineTargetDefinition = serde_json::from_value(config.clone())
                    .map_err(|source| PlanError::InvalidTargetConfig {
                        kind: target_type.to_string(),
                        source,
                    })?;
                definition.validate()?;
                Ok(TargetDefinition::Machine(definition))
            }
        }
    }

    /// The target type of this definition.
    pub fn target_type(&self) -> TargetType {
        match self {
            TargetDefinition::Machine(_) => TargetType::Machine,
        }
    }

    /// Percentage of effective hosts to attack.
    pub fn blast_radius(&self) -> u32 {
        match self {
            TargetDefinition::Machine(m) => m.blast_radius,
        }
    }

    /// Deduplicated union of hostnames and expanded hostpatterns.
    pub fn effective_hosts(&self) -> Result<Vec<String>, PatternError> {
        match self {
            TargetDefinition::Machine(m) => m.effective_hosts(),
        }
    }
}

/// SSH connection settings for machine targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshConfig {
    /// Remote user; falls back to the local SSH configuration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// SSH port (default: 22).
    #[serde(default = "default_ssh_port")]
    pub port: u16,
}

fn default_ssh_port() -> u16 {
    22
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: None,
            port: default_ssh_port(),
        }
    }
}

/// Target definition for machines reached over SSH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineTargetDefinition {
    /// Percentage (0-100) of the effective hosts to attack.
    pub blast_radius: u32,
    /// Literal hostnames.
    #[serde(default)]
    pub hostnames: Vec<String>,
    /// Bracket-range hostpatterns, e.g. `web[01-05].example.com`.
    #[serde(default)]
    pub hostpatterns: Vec<String>,
    /// SSH connection settings.
    #[serde(default)]
    pub ssh_config: SshConfig,
}

impl MachineTargetDefinition {
    /// Create a definition with the given blast radius and no hosts.
    pub fn new(blast_radius: u32) -> Self {
        Self {
            blast_radius,
            hostnames: Vec::new(),
            hostpatterns: Vec::new(),
            ssh_config: SshConfig::default(),
        }
    }

    /// Add literal hostnames.
    pub fn with_hostnames<I, S>(mut self, hostnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostnames.extend(hostnames.into_iter().map(Into::into));
        self
    }

    /// Add hostpatterns.
    pub fn with_hostpatterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostpatterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Set the remote SSH user.
    pub fn with_ssh_user(mut self, user: &str) -> Self {
        self.ssh_config.user = Some(user.to_string());
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.blast_radius > 100 {
            return Err(PlanError::InvalidBlastRadius(self.blast_radius));
        }
        Ok(())
    }

    /// Expand every hostpattern, in declaration order.
    ///
    /// Does not deduplicate, neither within the expansion nor against
    /// `hostnames`.
    pub fn expand_hostpatterns(&self) -> Result<Vec<String>, PatternError> {
        hostpattern::expand_all(&self.hostpatterns)
    }

    /// Hostnames followed by expanded hostpatterns, first occurrence wins.
    pub fn effective_hosts(&self) -> Result<Vec<String>, PatternError> {
        let expanded = self.expand_hostpatterns()?;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hosts = Vec::with_capacity(self.hostnames.len() + expanded.len());
        for host in self.hostnames.iter().chain(expanded.iter()) {
            if seen.insert(host.as_str()) {
                hosts.push(host.clone());
            }
        }
        Ok(hosts)
    }
}
