//! Error types for fracture test plans.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or exporting a test plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Reading or writing a plan document failed
    #[error("io error on {path}: {source}")]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Blast radius outside 0..=100
    #[error("blast radius must be between 0 and 100, got {0}")]
    InvalidBlastRadius(u32),

    /// A verification entry is not bound to any system state
    #[error("verification entry {index} has no system states")]
    EmptyStates {
        /// Position of the entry in the verification list.
        index: usize,
    },

    /// The attack declares no agents
    #[error("attack must declare at least one agent")]
    NoAgents,

    /// Agent type has no registered agent
    #[error("unknown agent type: {0}")]
    UnknownAgent(String),

    /// Verification type has no registered variant
    #[error("unsupported verification type: {0}")]
    UnsupportedVerificationType(String),

    /// Verification config does not match the shape of its type
    #[error("invalid {kind} verification config: {source}")]
    InvalidVerificationConfig {
        /// Verification type discriminator.
        kind: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Target config does not match the shape of its target type
    #[error("invalid {kind} target config: {source}")]
    InvalidTargetConfig {
        /// Target type discriminator.
        kind: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A hostpattern could not be expanded
    #[error("hostpattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Neither hostnames nor hostpatterns produced a host
    #[error("target definition resolves to no hosts")]
    EmptyPopulation,
}

/// Errors produced while expanding a bracket-range hostpattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Pattern string is empty
    #[error("hostpattern is empty")]
    Empty,

    /// A `[` without a matching `]`, or a stray `]`
    #[error("unbalanced brackets in hostpattern {0:?}")]
    Unbalanced(String),

    /// Range bounds are not `digits-digits`
    #[error("malformed range {range:?} in hostpattern {pattern:?}")]
    NonNumeric {
        /// The full pattern.
        pattern: String,
        /// The bracket contents.
        range: String,
    },

    /// Upper bound is lower than the lower bound
    #[error("reversed range [{start}-{end}] in hostpattern {pattern:?}")]
    Reversed {
        /// The full pattern.
        pattern: String,
        /// Lower bound as written.
        start: String,
        /// Upper bound as written.
        end: String,
    },

    /// Expansion would produce more hostnames than allowed
    #[error("hostpattern {pattern:?} expands to more than {limit} hosts")]
    TooLarge {
        /// The full pattern.
        pattern: String,
        /// Maximum number of hostnames per pattern.
        limit: usize,
    },
}
