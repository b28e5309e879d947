//! Attack configuration: a target definition plus the agents to run on it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;
use crate::target::{TargetDefinition, TargetType};

/// Attack section of a test plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AttackConfig {
    /// Selects the [`TargetDefinition`] variant and the executor.
    pub target_type: TargetType,
    /// Raw target settings, resolved by [`AttackConfig::get_target_config`].
    pub target_config: serde_json::Value,
    /// Agents to run against the selected targets, in order.
    pub agents: Vec<AgentConfig>,
}

impl AttackConfig {
    /// Create an attack config.
    pub fn new(target_type: TargetType, target_config: serde_json::Value, agents: Vec<AgentConfig>) -> Self {
        Self {
            target_type,
            target_config,
            agents,
        }
    }

    /// Resolve `target_config` into the definition for `target_type`.
    pub fn get_target_config(&self) -> Result<TargetDefinition, PlanError> {
        TargetDefinition::resolve(self.target_type, &self.target_config)
    }

    /// Resolved agent types, in declaration order.
    pub fn agent_types(&self) -> Result<Vec<AgentType>, PlanError> {
        self.agents.iter().map(AgentConfig::agent_type).collect()
    }

    /// Check the target definition and agent list.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.get_target_config()?;
        if self.agents.is_empty() {
            return Err(PlanError::NoAgents);
        }
        self.agent_types()?;
        Ok(())
    }
}

/// One agent entry of an attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Agent name, e.g. `cpu_burn`.
    #[serde(rename = "type")]
    pub agent_type: String,
    /// Agent settings, passed through to the agent untouched.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl AgentConfig {
    /// Create an agent entry.
    pub fn new(agent_type: &str, config: serde_json::Value) -> Self {
        Self {
            agent_type: agent_type.to_string(),
            config,
        }
    }

    /// Resolve the agent name against the known agents.
    pub fn agent_type(&self) -> Result<AgentType, PlanError> {
        self.agent_type.parse()
    }
}

/// Known attack agents. Agents are opaque here; only the name is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    /// Does nothing; useful for dry runs.
    NoOp,
    /// Burns CPU cores.
    CpuBurn,
    /// Fills a disk partition.
    DiskFill,
    /// Stops the host answering ICMP echo.
    PingDisable,
    /// Blocks inbound/outbound traffic on selected ports.
    TrafficBlock,
    /// Blocks DNS resolution.
    DnsBlock,
}

const AGENT_TYPES: &[(&str, AgentType)] = &[
    ("no_op", AgentType::NoOp),
    ("cpu_burn", AgentType::CpuBurn),
    ("disk_fill", AgentType::DiskFill),
    ("ping_disable", AgentType::PingDisable),
    ("traffic_block", AgentType::TrafficBlock),
    ("dns_block", AgentType::DnsBlock),
];

impl AgentType {
    /// The document name of this agent.
    pub fn as_str(&self) -> &'static str {
        AGENT_TYPES
            .iter()
            .find(|(_, agent)| agent == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AGENT_TYPES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, agent)| *agent)
            .ok_or_else(|| PlanError::UnknownAgent(s.to_string()))
    }
}
