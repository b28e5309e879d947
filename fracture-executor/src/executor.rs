//! Attack executors.
//!
//! An executor consumes a validated [`TestPlan`], selects its targets once at
//! construction, and drives a [`Runner`] against them. The lifecycle itself
//! lives in [`fracture_core::ExecutorState`]; this module only carries out
//! the actions the state machine returns.
//!
//! Per-host work runs concurrently on a tokio `JoinSet`, bounded by a
//! semaphore. Each host task dispatches its own `on_target_*` event once the
//! runner reports, so an abandoned host never dispatches anything.

use crate::config::{Config, EmptyTargetPolicy, ExecutorConfig};
use crate::runner::{RunRequest, Runner, RunnerError};
use async_trait::async_trait;
use fracture_core::{
    select_targets, DispatchError, ExecutorState, HookError, HookEvent, HookFailure, HookId,
    HookRegistry, HostOutcome, LifecycleAction, LifecycleEvent, MachineEvent, MachineEventKind,
    RunStatus, RunSummary, TargetSelection,
};
use fracture_types::{PlanError, TargetDefinition, TestPlan, TestPlanId};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Executor errors.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The plan could not be turned into targets.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The blast radius selected no hosts and empty runs are not allowed.
    #[error("blast radius {blast_radius}% of {population} hosts selects no targets")]
    NoTargets {
        /// Size of the effective host population.
        population: usize,
        /// Requested percentage.
        blast_radius: u32,
    },

    /// The operation is not valid in the current lifecycle state.
    #[error("cannot {operation} while executor is {state}")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// Current state.
        state: String,
    },

    /// The runner failed; teardown has already run.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// A hook could not be registered.
    #[error(transparent)]
    Hook(#[from] HookError),
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Aggregate host outcomes.
    pub summary: RunSummary,
    /// Hook handler failures, in dispatch completion order.
    pub hook_failures: Vec<DispatchError>,
}

impl RunReport {
    /// True if every target passed and no hook handler failed.
    pub fn is_clean(&self) -> bool {
        self.summary.all_passed() && self.hook_failures.is_empty()
    }
}

/// Common executor surface; one implementation per target type.
#[async_trait]
pub trait Executor: Send {
    /// Events this executor dispatches.
    type Event: HookEvent;

    /// The hook registry.
    fn hooks(&self) -> &HookRegistry<Self::Event>;

    /// Hosts selected at construction.
    fn target_hosts(&self) -> &[String];

    /// Current lifecycle state.
    fn state(&self) -> &ExecutorState;

    /// Establish the runner context. Call once.
    async fn prepare(&mut self) -> Result<(), ExecutorError>;

    /// Run the attack, preparing first if needed.
    async fn execute(&mut self) -> Result<RunReport, ExecutorError>;
}

type HostResult = Result<(HostOutcome, Option<DispatchError>), RunnerError>;

/// Per-run bookkeeping, owned by one `execute` call.
struct RunContext {
    summary: RunSummary,
    hook_failures: Vec<DispatchError>,
    tasks: JoinSet<HostResult>,
    fatal: Option<RunnerError>,
}

impl RunContext {
    fn record(&mut self, outcome: HostOutcome, failure: Option<DispatchError>) {
        info!(host = %outcome.host, status = %outcome.status, "target reported");
        self.summary.record(outcome);
        self.hook_failures.extend(failure);
    }
}

/// Executor for machine targets reached through a [`Runner`].
pub struct MachineExecutor<R: Runner> {
    plan_id: TestPlanId,
    selection: TargetSelection,
    settings: ExecutorConfig,
    request: Arc<RunRequest>,
    runner: Arc<R>,
    hooks: Arc<HookRegistry<MachineEvent>>,
    state: ExecutorState,
    runner_prepared: bool,
}

impl<R: Runner> MachineExecutor<R> {
    /// Create an executor, selecting targets with the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Fails if the target config cannot be resolved, a hostpattern is
    /// malformed, or the effective host population is empty.
    pub fn new(plan: &TestPlan, config: &Config, runner: R) -> Result<Self, ExecutorError> {
        Self::with_rng(plan, config, runner, &mut rand::thread_rng())
    }

    /// Create an executor, selecting targets with `rng`.
    pub fn with_rng<G>(
        plan: &TestPlan,
        config: &Config,
        runner: R,
        rng: &mut G,
    ) -> Result<Self, ExecutorError>
    where
        G: Rng + ?Sized,
    {
        let TargetDefinition::Machine(target) = plan.attack.get_target_config()?;
        let population = target.effective_hosts().map_err(PlanError::from)?;
        if population.is_empty() {
            return Err(PlanError::EmptyPopulation.into());
        }

        let selection = select_targets(&population, target.blast_radius, rng);
        if selection.rounded_to_zero() {
            warn!(
                plan_id = %plan.id,
                population = selection.population,
                blast_radius = selection.blast_radius,
                "blast radius rounds down to zero targets"
            );
        } else if selection.is_empty() {
            warn!(plan_id = %plan.id, "blast radius is 0, no targets selected");
        } else {
            info!(
                plan_id = %plan.id,
                population = selection.population,
                targets = selection.len(),
                "selected targets"
            );
        }

        let request = RunRequest {
            plan_id: plan.id,
            hosts: selection.hosts.clone(),
            remote_user: target.ssh_config.user.clone(),
            port: target.ssh_config.port,
            steps: config.provision_steps(),
        };

        Ok(Self {
            plan_id: plan.id,
            selection,
            settings: config.executor.clone(),
            request: Arc::new(request),
            runner: Arc::new(runner),
            hooks: Arc::new(HookRegistry::new(&MachineEventKind::ALL)),
            state: ExecutorState::new(),
            runner_prepared: false,
        })
    }

    /// The target selection computed at construction.
    pub fn selection(&self) -> &TargetSelection {
        &self.selection
    }

    /// The runner this executor drives.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Register a hook handler for `kind`.
    pub fn register_hook<F>(
        &self,
        kind: MachineEventKind,
        handler: F,
    ) -> Result<HookId, ExecutorError>
    where
        F: Fn(&MachineEvent) -> Result<(), HookFailure> + Send + Sync + 'static,
    {
        Ok(self.hooks.register(kind, handler)?)
    }

    /// Run the attack until every target reports or `shutdown` resolves.
    ///
    /// On shutdown or timeout, in-flight hosts are abandoned and listed in
    /// the summary; teardown runs on every path.
    pub async fn execute_until<F>(&mut self, shutdown: F) -> Result<RunReport, ExecutorError>
    where
        F: Future<Output = ()> + Send,
    {
        if self.state == ExecutorState::Created {
            self.prepare().await?;
        }
        if !matches!(self.state, ExecutorState::Prepared { .. }) {
            return Err(self.invalid_state("execute"));
        }

        let mut run = RunContext {
            summary: RunSummary::new(self.plan_id, self.selection.hosts.clone()),
            hook_failures: Vec::new(),
            tasks: JoinSet::new(),
            fatal: None,
        };

        info!(plan_id = %self.plan_id, targets = self.selection.len(), "starting attack");
        let actions = self.transition(LifecycleEvent::ExecuteRequested);
        self.perform(actions, &mut run).await;

        let timeout = self.settings.run_timeout();
        let deadline = async move {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(deadline);

        while self.state.is_running() {
            let event = tokio::select! {
                joined = run.tasks.join_next() => Self::on_joined(joined, &mut run),
                _ = &mut shutdown => {
                    warn!(plan_id = %self.plan_id, "attack cancelled");
                    LifecycleEvent::Cancelled
                }
                _ = &mut deadline => {
                    warn!(plan_id = %self.plan_id, "attack timed out");
                    LifecycleEvent::TimedOut
                }
            };
            let actions = self.transition(event);
            self.perform(actions, &mut run).await;
        }

        match &self.state {
            ExecutorState::Completed { status } => {
                info!(plan_id = %self.plan_id, status = %status, "attack finished");
                Ok(RunReport {
                    summary: run.summary,
                    hook_failures: run.hook_failures,
                })
            }
            ExecutorState::Failed { error } => Err(run
                .fatal
                .take()
                .unwrap_or_else(|| RunnerError::Fatal(error.clone()))
                .into()),
            _ => Err(self.invalid_state("finish")),
        }
    }

    fn on_joined(
        joined: Option<Result<HostResult, JoinError>>,
        run: &mut RunContext,
    ) -> LifecycleEvent {
        match joined {
            Some(Ok(Ok((outcome, failure)))) => {
                run.record(outcome, failure);
                LifecycleEvent::HostReported
            }
            Some(Ok(Err(e))) => {
                error!(error = %e, "runner failed");
                let error = e.to_string();
                run.fatal = Some(e);
                LifecycleEvent::RunnerFailed { error }
            }
            Some(Err(e)) => {
                error!(error = %e, "host task failed");
                LifecycleEvent::RunnerFailed {
                    error: format!("host task failed: {}", e),
                }
            }
            None => LifecycleEvent::RunnerFailed {
                error: "host tasks ended before every target reported".into(),
            },
        }
    }

    fn transition(&mut self, event: LifecycleEvent) -> Vec<LifecycleAction> {
        let state = std::mem::take(&mut self.state);
        let (next, actions) = state.on_event(event);
        debug!(state = ?next, actions = actions.len(), "lifecycle transition");
        self.state = next;
        actions
    }

    async fn perform(&mut self, actions: Vec<LifecycleAction>, run: &mut RunContext) {
        for action in actions {
            match action {
                LifecycleAction::DispatchStart => {
                    let event = MachineEvent::Start {
                        plan_id: self.plan_id,
                        targets: self.selection.hosts.clone(),
                    };
                    run.hook_failures.extend(self.dispatch(&event));
                }
                LifecycleAction::SubmitHosts => self.submit_hosts(run),
                LifecycleAction::AbortHosts => {
                    run.tasks.abort_all();
                    while let Some(joined) = run.tasks.join_next().await {
                        // Hosts that resolved before the abort already dispatched.
                        if let Ok(Ok((outcome, failure))) = joined {
                            run.record(outcome, failure);
                        }
                    }
                }
                LifecycleAction::DispatchEnd { status } => {
                    run.summary.finish(status);
                    if status == RunStatus::NoTargets {
                        warn!(plan_id = %self.plan_id, "attack ran against no targets");
                    }
                    if !run.summary.abandoned.is_empty() {
                        warn!(abandoned = run.summary.abandoned.len(), "hosts abandoned");
                    }
                    let event = MachineEvent::End(run.summary.clone());
                    run.hook_failures.extend(self.dispatch(&event));
                }
                LifecycleAction::Teardown => self.teardown().await,
            }
        }
    }

    fn submit_hosts(&self, run: &mut RunContext) {
        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        for host in &self.selection.hosts {
            let host = host.clone();
            let permits = Arc::clone(&permits);
            let runner = Arc::clone(&self.runner);
            let request = Arc::clone(&self.request);
            let hooks = Arc::clone(&self.hooks);

            run.tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| RunnerError::Fatal(e.to_string()))?;
                let outcome = runner.run_host(&host, &request).await?;
                let failure = hooks.dispatch(&MachineEvent::for_outcome(outcome.clone())).err();
                if let Some(failure) = &failure {
                    warn!(host = %host, error = %failure, "hook handlers failed");
                }
                Ok((outcome, failure))
            });
        }
    }

    fn dispatch(&self, event: &MachineEvent) -> Option<DispatchError> {
        let failure = self.hooks.dispatch(event).err();
        if let Some(failure) = &failure {
            warn!(error = %failure, "hook handlers failed");
        }
        failure
    }

    async fn teardown(&mut self) {
        if std::mem::take(&mut self.runner_prepared) {
            debug!(plan_id = %self.plan_id, "releasing runner context");
            if let Err(e) = self.runner.cleanup().await {
                warn!(error = %e, "runner cleanup failed");
            }
        }
    }

    fn invalid_state(&self, operation: &'static str) -> ExecutorError {
        ExecutorError::InvalidState {
            operation,
            state: format!("{:?}", self.state),
        }
    }
}

#[async_trait]
impl<R: Runner> Executor for MachineExecutor<R> {
    type Event = MachineEvent;

    fn hooks(&self) -> &HookRegistry<MachineEvent> {
        &self.hooks
    }

    fn target_hosts(&self) -> &[String] {
        &self.selection.hosts
    }

    fn state(&self) -> &ExecutorState {
        &self.state
    }

    async fn prepare(&mut self) -> Result<(), ExecutorError> {
        if self.state != ExecutorState::Created {
            return Err(self.invalid_state("prepare"));
        }

        if self.selection.is_empty() {
            match self.settings.empty_targets {
                EmptyTargetPolicy::Skip => {
                    warn!(plan_id = %self.plan_id, "no targets selected, attack will be a no-op");
                    self.transition(LifecycleEvent::PrepareSucceeded { targets: 0 });
                    return Ok(());
                }
                EmptyTargetPolicy::Fail => {
                    let err = ExecutorError::NoTargets {
                        population: self.selection.population,
                        blast_radius: self.selection.blast_radius,
                    };
                    let actions = self.transition(LifecycleEvent::PrepareFailed {
                        error: err.to_string(),
                    });
                    self.finish_early(actions).await;
                    return Err(err);
                }
            }
        }

        self.runner_prepared = true;
        if let Err(e) = self.runner.prepare(&self.request).await {
            error!(error = %e, "runner prepare failed");
            let actions = self.transition(LifecycleEvent::PrepareFailed {
                error: e.to_string(),
            });
            self.finish_early(actions).await;
            return Err(e.into());
        }

        debug!(plan_id = %self.plan_id, targets = self.selection.len(), "runner prepared");
        self.transition(LifecycleEvent::PrepareSucceeded {
            targets: self.selection.len(),
        });
        Ok(())
    }

    async fn execute(&mut self) -> Result<RunReport, ExecutorError> {
        self.execute_until(std::future::pending()).await
    }
}

impl<R: Runner> MachineExecutor<R> {
    /// Carry out the actions of a failed prepare; only teardown applies.
    async fn finish_early(&mut self, actions: Vec<LifecycleAction>) {
        for action in actions {
            if action == LifecycleAction::Teardown {
                self.teardown().await;
            }
        }
    }
}
