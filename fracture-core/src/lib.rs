//! # fracture-core
//!
//! Pure logic for fracture (no I/O, instant tests).
//!
//! This crate implements the algorithms and state machines behind an
//! attack run without touching the network:
//!
//! - [`sampler`] - Blast-radius target selection over an explicit random source
//! - [`hooks`] - Typed event hook registry
//! - [`lifecycle`] - Executor lifecycle state machine
//! - [`outcome`] - Per-host outcomes and run aggregation
//! - [`provision`] - The fixed provisioning steps sent to a runner
//!
//! The actual remote execution is performed by `fracture-executor`, which
//! drives these pieces and interprets the lifecycle actions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod events;
pub mod hooks;
pub mod lifecycle;
pub mod outcome;
pub mod provision;
pub mod sampler;

pub use events::{MachineEvent, MachineEventKind};
pub use hooks::{DispatchError, HandlerFailure, HookError, HookEvent, HookFailure, HookId, HookRegistry};
pub use lifecycle::{ExecutorState, LifecycleAction, LifecycleEvent};
pub use outcome::{HostOutcome, HostStatus, RunStatus, RunSummary, StepResult};
pub use provision::ProvisionStep;
pub use sampler::{sample_count, sample_hosts, select_targets, TargetSelection};
