//! Remote runner abstraction.
//!
//! The executor never opens connections itself. It builds a [`RunRequest`]
//! and hands each selected host to a [`Runner`], which reports a per-host
//! [`HostOutcome`].
//!
//! # Design
//!
//! The runner trait is async and request-scoped:
//! - `prepare()` establishes the runner context for a request
//! - `run_host()` runs the provisioning steps on one host
//! - `cleanup()` releases the context
//!
//! Unreachable and failed hosts are ordinary `Ok` outcomes. An `Err` from
//! any method means the runner itself is broken and fails the whole run.
//!
//! # Example
//!
//! ```ignore
//! let runner = MockRunner::new();
//! runner.fail_host("web02", "pip install failed");
//! runner.prepare(&request).await?;
//! let outcome = runner.run_host("web02", &request).await?;
//! ```

mod mock;
mod ssh;

pub use mock::MockRunner;
pub use ssh::SshRunner;

use async_trait::async_trait;
use fracture_core::{HostOutcome, ProvisionStep};
use fracture_types::TestPlanId;
use thiserror::Error;

/// Runner-level errors. Per-host failures are not errors.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// `run_host` was called before `prepare`.
    #[error("runner not prepared")]
    NotPrepared,

    /// A local process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Any other runner failure.
    #[error("runner failed: {0}")]
    Fatal(String),
}

/// Everything a runner needs to attack the selected hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Plan being executed.
    pub plan_id: TestPlanId,
    /// Selected target hosts.
    pub hosts: Vec<String>,
    /// Remote user; the runner's default when absent.
    pub remote_user: Option<String>,
    /// Remote port.
    pub port: u16,
    /// Provisioning steps, run in order on every host.
    pub steps: Vec<ProvisionStep>,
}

/// Runner trait for executing provisioning steps on remote hosts.
///
/// Implementations handle the underlying execution mechanism
/// (ssh, mock, etc). One runner serves one run at a time.
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Establish the runner context for `request`.
    async fn prepare(&self, request: &RunRequest) -> Result<(), RunnerError>;

    /// Run every step of `request` on `host` and report what happened.
    ///
    /// Called concurrently for different hosts.
    async fn run_host(&self, host: &str, request: &RunRequest) -> Result<HostOutcome, RunnerError>;

    /// Release the runner context.
    async fn cleanup(&self) -> Result<(), RunnerError>;
}
