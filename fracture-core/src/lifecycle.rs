//! Executor lifecycle state machine.
//!
//! Pure and side-effect free: [`ExecutorState::on_event`] takes an event and
//! returns the next state plus the actions the caller must perform, in order.
//! The async driver in `fracture-executor` feeds events in and carries the
//! actions out (dispatching hooks, submitting hosts, tearing down the runner).

use crate::outcome::RunStatus;

/// Lifecycle of one executor instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorState {
    /// Targets computed, runner not yet prepared.
    Created,
    /// Runner context established.
    Prepared {
        /// Number of selected targets.
        targets: usize,
    },
    /// Hosts submitted to the runner.
    Running {
        /// Hosts that have not reported yet.
        pending: usize,
    },
    /// The run ended and teardown was requested.
    Completed {
        /// How the run ended.
        status: RunStatus,
    },
    /// The runner failed fatally, or preparation failed.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

impl ExecutorState {
    /// Create a state machine in the Created state.
    pub fn new() -> Self {
        Self::Created
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// Events that are not valid in the current state leave it unchanged and
    /// produce no actions.
    pub fn on_event(self, event: LifecycleEvent) -> (Self, Vec<LifecycleAction>) {
        match (self, event) {
            // From Created
            (Self::Created, LifecycleEvent::PrepareSucceeded { targets }) => {
                (Self::Prepared { targets }, vec![])
            }
            (Self::Created, LifecycleEvent::PrepareFailed { error }) => {
                (Self::Failed { error }, vec![LifecycleAction::Teardown])
            }

            // From Prepared
            (Self::Prepared { targets: 0 }, LifecycleEvent::ExecuteRequested) => (
                Self::Completed {
                    status: RunStatus::NoTargets,
                },
                vec![
                    LifecycleAction::DispatchStart,
                    LifecycleAction::DispatchEnd {
                        status: RunStatus::NoTargets,
                    },
                    LifecycleAction::Teardown,
                ],
            ),
            (Self::Prepared { targets }, LifecycleEvent::ExecuteRequested) => (
                Self::Running { pending: targets },
                vec![LifecycleAction::DispatchStart, LifecycleAction::SubmitHosts],
            ),
            (Self::Prepared { .. }, LifecycleEvent::Cancelled) => (
                Self::Completed {
                    status: RunStatus::Cancelled,
                },
                vec![LifecycleAction::Teardown],
            ),

            // From Running
            (Self::Running { pending }, LifecycleEvent::HostReported) => {
                let pending = pending.saturating_sub(1);
                if pending == 0 {
                    finish(RunStatus::Completed, false)
                } else {
                    (Self::Running { pending }, vec![])
                }
            }
            (Self::Running { .. }, LifecycleEvent::Cancelled) => finish(RunStatus::Cancelled, true),
            (Self::Running { .. }, LifecycleEvent::TimedOut) => finish(RunStatus::TimedOut, true),
            (Self::Running { .. }, LifecycleEvent::RunnerFailed { error }) => (
                Self::Failed { error },
                vec![LifecycleAction::AbortHosts, LifecycleAction::Teardown],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if the run has ended, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Check if hosts are in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl Default for ExecutorState {
    fn default() -> Self {
        Self::new()
    }
}

fn finish(status: RunStatus, abort: bool) -> (ExecutorState, Vec<LifecycleAction>) {
    let mut actions = Vec::with_capacity(3);
    if abort {
        actions.push(LifecycleAction::AbortHosts);
    }
    actions.push(LifecycleAction::DispatchEnd { status });
    actions.push(LifecycleAction::Teardown);
    (ExecutorState::Completed { status }, actions)
}

/// Events that drive the executor lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Runner context established for the selected targets.
    PrepareSucceeded {
        /// Number of selected targets.
        targets: usize,
    },
    /// Preparation failed.
    PrepareFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// Caller asked to execute the attack.
    ExecuteRequested,
    /// One host's unit of work fully resolved.
    HostReported,
    /// The runner itself failed (not a per-host failure).
    RunnerFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// The run was cancelled.
    Cancelled,
    /// The run exceeded its timeout.
    TimedOut,
}

/// Actions the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Dispatch `on_start` with the selected targets.
    DispatchStart,
    /// Submit every target host to the runner.
    SubmitHosts,
    /// Abandon in-flight host work without dispatching its outcomes.
    AbortHosts,
    /// Close the summary and dispatch `on_end`.
    DispatchEnd {
        /// Final run status.
        status: RunStatus,
    },
    /// Release the runner context.
    Teardown,
}
