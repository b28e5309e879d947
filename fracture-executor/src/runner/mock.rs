//! Mock runner for testing.
//!
//! Allows scripting per-host outcomes and delays, injecting runner failures,
//! and capturing calls for verification.

use super::{RunRequest, Runner, RunnerError};
use async_trait::async_trait;
use fracture_core::{HostOutcome, HostStatus, StepResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Mock runner for testing.
///
/// Every host passes unless scripted otherwise. Clones share state.
#[derive(Debug, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    scripted: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    fatal_host: Option<(String, String)>,
    fail_next_prepare: Option<String>,
    prepared: bool,
    last_request: Option<RunRequest>,
    prepare_calls: usize,
    cleanup_calls: usize,
    hosts_run: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Clone)]
struct Scripted {
    status: HostStatus,
    message: String,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRunnerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `host` fail its last provisioning step with `message`.
    pub fn fail_host(&self, host: &str, message: &str) {
        self.script(host, HostStatus::Failed, message);
    }

    /// Make `host` unreachable.
    pub fn unreachable_host(&self, host: &str, message: &str) {
        self.script(host, HostStatus::Unreachable, message);
    }

    fn script(&self, host: &str, status: HostStatus, message: &str) {
        let mut inner = self.lock();
        inner.scripted.insert(
            host.to_string(),
            Scripted {
                status,
                message: message.to_string(),
            },
        );
    }

    /// Make `run_host(host)` fail with a runner-level error.
    pub fn fatal_on_host(&self, host: &str, error: &str) {
        let mut inner = self.lock();
        inner.fatal_host = Some((host.to_string(), error.to_string()));
    }

    /// Cause the next `prepare()` to fail with the given error.
    pub fn fail_next_prepare(&self, error: &str) {
        let mut inner = self.lock();
        inner.fail_next_prepare = Some(error.to_string());
    }

    /// Delay `run_host(host)` by `delay`.
    pub fn delay_host(&self, host: &str, delay: Duration) {
        let mut inner = self.lock();
        inner.delays.insert(host.to_string(), delay);
    }

    /// Delay every host without an explicit delay.
    pub fn set_default_delay(&self, delay: Duration) {
        let mut inner = self.lock();
        inner.default_delay = delay;
    }

    /// Number of `prepare()` calls.
    pub fn prepare_calls(&self) -> usize {
        self.lock().prepare_calls
    }

    /// Number of `cleanup()` calls.
    pub fn cleanup_calls(&self) -> usize {
        self.lock().cleanup_calls
    }

    /// Hosts passed to `run_host()`, in call order.
    pub fn hosts_run(&self) -> Vec<String> {
        self.lock().hosts_run.clone()
    }

    /// Highest number of concurrent `run_host()` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    /// The request passed to the last `prepare()`.
    pub fn last_request(&self) -> Option<RunRequest> {
        self.lock().last_request.clone()
    }

    /// Check if the runner context is currently open.
    pub fn is_prepared(&self) -> bool {
        self.lock().prepared
    }

    /// Clear all state (scripts, calls, context).
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = MockRunnerInner::default();
    }
}

impl Clone for MockRunner {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn step_results(request: &RunRequest, failure: Option<&str>) -> Vec<StepResult> {
    let last = request.steps.len().saturating_sub(1);
    request
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let failed = failure.is_some() && i == last;
            StepResult {
                step: step.name().to_string(),
                exit_code: if failed { 1 } else { 0 },
                stdout: String::new(),
                stderr: if failed {
                    failure.unwrap_or_default().to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect()
}

#[async_trait]
impl Runner for MockRunner {
    async fn prepare(&self, request: &RunRequest) -> Result<(), RunnerError> {
        let mut inner = self.lock();
        inner.prepare_calls += 1;

        // Check for forced failure
        if let Some(error) = inner.fail_next_prepare.take() {
            return Err(RunnerError::Fatal(error));
        }

        inner.prepared = true;
        inner.last_request = Some(request.clone());
        Ok(())
    }

    async fn run_host(&self, host: &str, request: &RunRequest) -> Result<HostOutcome, RunnerError> {
        let (delay, scripted) = {
            let mut inner = self.lock();
            if !inner.prepared {
                return Err(RunnerError::NotPrepared);
            }
            inner.hosts_run.push(host.to_string());

            if let Some((fatal_host, error)) = &inner.fatal_host {
                if fatal_host == host {
                    return Err(RunnerError::Fatal(error.clone()));
                }
            }

            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
            let delay = inner.delays.get(host).copied().unwrap_or(inner.default_delay);
            (delay, inner.scripted.get(host).cloned())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.lock().in_flight -= 1;

        let outcome = match scripted {
            None => HostOutcome::passed(host, step_results(request, None)),
            Some(Scripted {
                status: HostStatus::Passed,
                ..
            }) => HostOutcome::passed(host, step_results(request, None)),
            Some(Scripted {
                status: HostStatus::Failed,
                message,
            }) => HostOutcome::failed(host, step_results(request, Some(&message)), &message),
            Some(Scripted {
                status: HostStatus::Unreachable,
                message,
            }) => HostOutcome::unreachable(host, &message),
        };
        Ok(outcome)
    }

    async fn cleanup(&self) -> Result<(), RunnerError> {
        let mut inner = self.lock();
        inner.cleanup_calls += 1;
        inner.prepared = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fracture_core::ProvisionStep;
    use fracture_types::TestPlanId;

    fn request(hosts: &[&str]) -> RunRequest {
        RunRequest {
            plan_id: TestPlanId::random(),
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            remote_user: Some("chaos".into()),
            port: 22,
            steps: ProvisionStep::sequence("python3", "fracture-agents", "fracture_env"),
        }
    }

    // ===========================================
    // MockRunner Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_runner_prepares_and_cleans_up() {
        let runner = MockRunner::new();
        let req = request(&["a"]);
        assert!(!runner.is_prepared());

        runner.prepare(&req).await.unwrap();
        assert!(runner.is_prepared());
        assert_eq!(runner.last_request(), Some(req));

        runner.cleanup().await.unwrap();
        assert!(!runner.is_prepared());
        assert_eq!(runner.prepare_calls(), 1);
        assert_eq!(runner.cleanup_calls(), 1);
    }

    #[tokio::test]
    async fn hosts_pass_by_default() {
        let runner = MockRunner::new();
        let req = request(&["a"]);
        runner.prepare(&req).await.unwrap();

        let outcome = runner.run_host("a", &req).await.unwrap();
        assert_eq!(outcome.status, HostStatus::Passed);
        assert_eq!(outcome.steps.len(), 3);
        assert!(outcome.steps.iter().all(StepResult::success));
    }

    #[tokio::test]
    async fn scripted_outcomes() {
        let runner = MockRunner::new();
        runner.fail_host("b", "pip install failed");
        runner.unreachable_host("c", "connection timed out");
        let req = request(&["b", "c"]);
        runner.prepare(&req).await.unwrap();

        let failed = runner.run_host("b", &req).await.unwrap();
        assert_eq!(failed.status, HostStatus::Failed);
        assert_eq!(failed.message.as_deref(), Some("pip install failed"));
        assert!(!failed.steps[2].success());
        assert_eq!(failed.steps[2].stderr, "pip install failed");

        let unreachable = runner.run_host("c", &req).await.unwrap();
        assert_eq!(unreachable.status, HostStatus::Unreachable);
        assert!(unreachable.steps.is_empty());

        assert_eq!(runner.hosts_run(), ["b", "c"]);
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn run_without_prepare_fails() {
        let runner = MockRunner::new();
        let result = runner.run_host("a", &request(&["a"])).await;
        assert!(matches!(result, Err(RunnerError::NotPrepared)));
    }

    #[tokio::test]
    async fn forced_prepare_failure() {
        let runner = MockRunner::new();
        runner.fail_next_prepare("inventory unavailable");

        let result = runner.prepare(&request(&["a"])).await;
        assert!(matches!(result, Err(RunnerError::Fatal(_))));
        assert!(!runner.is_prepared());

        // Next prepare should work
        runner.prepare(&request(&["a"])).await.unwrap();
    }

    #[tokio::test]
    async fn fatal_host_fails_the_runner() {
        let runner = MockRunner::new();
        runner.fatal_on_host("a", "engine crashed");
        let req = request(&["a", "b"]);
        runner.prepare(&req).await.unwrap();

        let result = runner.run_host("a", &req).await;
        assert!(matches!(result, Err(RunnerError::Fatal(msg)) if msg == "engine crashed"));
        assert!(runner.run_host("b", &req).await.is_ok());
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn clone_shares_state() {
        let runner1 = MockRunner::new();
        let runner2 = runner1.clone();
        let req = request(&["a"]);

        runner1.prepare(&req).await.unwrap();
        runner2.run_host("a", &req).await.unwrap();
        assert_eq!(runner1.hosts_run(), ["a"]);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let runner = MockRunner::new();
        runner.fail_host("a", "boom");
        runner.prepare(&request(&["a"])).await.unwrap();

        runner.reset();

        assert!(!runner.is_prepared());
        assert_eq!(runner.prepare_calls(), 0);
        assert!(runner.last_request().is_none());
    }
}
