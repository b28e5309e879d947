//! # fracture-types
//!
//! Test plan document model for the fracture chaos engine.
//!
//! This crate provides the foundational types used across all fracture crates:
//! - [`TestPlan`] - Root document: an attack plus verification checks
//! - [`AttackConfig`], [`TargetDefinition`] - What to attack and where
//! - [`VerificationConfig`], [`SystemState`] - Which checks run in which phase
//! - [`hostpattern`] - Bracket-range hostname expansion
//! - [`PlanError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod attack;
mod error;
pub mod hostpattern;
mod ids;
mod plan;
pub mod schema;
mod state;
mod target;
mod verification;

pub use attack::{AgentConfig, AgentType, AttackConfig};
pub use error::{PatternError, PlanError};
pub use ids::TestPlanId;
pub use plan::{DocumentFormat, TestPlan};
pub use state::SystemState;
pub use target::{MachineTargetDefinition, SshConfig, TargetDefinition, TargetType};
pub use verification::{
    verification_types, HttpRequestVerification, PythonModuleVerification, Verification,
    VerificationConfig,
};
