//! Per-host outcomes and their aggregation into a run summary.

use fracture_types::TestPlanId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Final status of one host in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    /// Every step succeeded.
    Passed,
    /// The host was reached but a step failed.
    Failed,
    /// The host could not be reached.
    Unreachable,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Passed => write!(f, "passed"),
            HostStatus::Failed => write!(f, "failed"),
            HostStatus::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Result of one provisioning step on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// Step name.
    pub step: String,
    /// Exit code (0 = success).
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl StepResult {
    /// Returns true if the step succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// What happened on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostOutcome {
    /// Host identifier.
    pub host: String,
    /// Final status.
    pub status: HostStatus,
    /// Steps that ran, in order.
    pub steps: Vec<StepResult>,
    /// Failure detail, if any.
    pub message: Option<String>,
}

impl HostOutcome {
    /// A host on which every step succeeded.
    pub fn passed(host: &str, steps: Vec<StepResult>) -> Self {
        Self {
            host: host.to_string(),
            status: HostStatus::Passed,
            steps,
            message: None,
        }
    }

    /// A reachable host on which a step failed.
    pub fn failed(host: &str, steps: Vec<StepResult>, message: &str) -> Self {
        Self {
            host: host.to_string(),
            status: HostStatus::Failed,
            steps,
            message: Some(message.to_string()),
        }
    }

    /// A host that could not be reached.
    pub fn unreachable(host: &str, message: &str) -> Self {
        Self {
            host: host.to_string(),
            status: HostStatus::Unreachable,
            steps: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every target reported an outcome.
    Completed,
    /// The blast radius selected no hosts; nothing was attacked.
    NoTargets,
    /// The run was cancelled; unfinished hosts were abandoned.
    Cancelled,
    /// The run hit its timeout; unfinished hosts were abandoned.
    TimedOut,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::NoTargets => write!(f, "no targets"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Aggregate result of one attack run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Plan that was executed.
    pub plan_id: TestPlanId,
    /// How the run ended.
    pub status: RunStatus,
    /// Selected target hosts.
    pub targets: Vec<String>,
    /// Outcomes in target order (after [`RunSummary::finish`]).
    pub outcomes: Vec<HostOutcome>,
    /// Targets that never reported an outcome.
    pub abandoned: Vec<String>,
}

impl RunSummary {
    /// Start a summary for the given targets.
    pub fn new(plan_id: TestPlanId, targets: Vec<String>) -> Self {
        Self {
            plan_id,
            status: RunStatus::Completed,
            targets,
            outcomes: Vec::new(),
            abandoned: Vec::new(),
        }
    }

    /// Record one host outcome.
    pub fn record(&mut self, outcome: HostOutcome) {
        self.outcomes.push(outcome);
    }

    /// Close the summary: order outcomes by target and list abandoned hosts.
    pub fn finish(&mut self, status: RunStatus) {
        let order: HashMap<&str, usize> = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, host)| (host.as_str(), i))
            .collect();
        self.outcomes
            .sort_by_key(|o| order.get(o.host.as_str()).copied().unwrap_or(usize::MAX));

        self.abandoned = self
            .targets
            .iter()
            .filter(|host| !self.outcomes.iter().any(|o| &o.host == *host))
            .cloned()
            .collect();
        self.status = status;
    }

    /// Hosts with the given status, in outcome order.
    pub fn hosts_with(&self, status: HostStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.host.as_str())
            .collect()
    }

    /// Hosts that passed.
    pub fn passed(&self) -> Vec<&str> {
        self.hosts_with(HostStatus::Passed)
    }

    /// Hosts that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.hosts_with(HostStatus::Failed)
    }

    /// Hosts that were unreachable.
    pub fn unreachable(&self) -> Vec<&str> {
        self.hosts_with(HostStatus::Unreachable)
    }

    /// True if the run completed and every target passed.
    pub fn all_passed(&self) -> bool {
        self.status == RunStatus::Completed
            && self.abandoned.is_empty()
            && self.outcomes.iter().all(|o| o.status == HostStatus::Passed)
    }
}
