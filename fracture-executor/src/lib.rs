//! # fracture-executor
//!
//! Async attack executor for the fracture chaos engine.
//!
//! Turns a validated test plan into an attack run: targets are selected
//! once, a [`Runner`] provisions each of them concurrently, and every
//! outcome is dispatched through the executor's hook registry.
//!
//! ## Features
//!
//! - **Runner Abstraction**: Pluggable remote execution (ssh, mock)
//! - **Bounded Concurrency**: Per-host tasks limited by a semaphore
//! - **Cooperative Cancellation**: Shutdown and timeout abandon in-flight hosts
//! - **Pure State Machine**: Uses fracture-core for the lifecycle
//!
//! ## Example
//!
//! ```ignore
//! use fracture_executor::{Config, MachineExecutor, SshRunner};
//!
//! let config = Config::default();
//! let runner = SshRunner::new(config.ssh.clone());
//! let mut executor = MachineExecutor::new(&plan, &config, runner)?;
//!
//! executor.register_hook(MachineEventKind::TargetFailed, |event| {
//!     eprintln!("{:?}", event);
//!     Ok(())
//! })?;
//! let report = executor.execute().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod executor;
pub mod runner;

pub use config::{Config, ConfigError, EmptyTargetPolicy, ExecutorConfig, SshRunnerConfig};
pub use executor::{Executor, ExecutorError, MachineExecutor, RunReport};
pub use runner::{MockRunner, RunRequest, Runner, RunnerError, SshRunner};
