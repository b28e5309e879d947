//! System states of a chaos test run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase of a chaos test run.
///
/// Phases occur in declaration order during a run, so the derived
/// ordering is meaningful: `PreValidation < Steady < Chaos < Recovered < PostValidation`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    /// Before the test starts, checking preconditions.
    PreValidation,
    /// System running normally, before the attack.
    Steady,
    /// Attack in progress.
    Chaos,
    /// Attack finished, system expected to have recovered.
    Recovered,
    /// After the test, checking postconditions.
    PostValidation,
}

impl SystemState {
    /// All states in run order.
    pub const ALL: [SystemState; 5] = [
        SystemState::PreValidation,
        SystemState::Steady,
        SystemState::Chaos,
        SystemState::Recovered,
        SystemState::PostValidation,
    ];

    /// The document name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemState::PreValidation => "PRE_VALIDATION",
            SystemState::Steady => "STEADY",
            SystemState::Chaos => "CHAOS",
            SystemState::Recovered => "RECOVERED",
            SystemState::PostValidation => "POST_VALIDATION",
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        SystemState::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| format!("unknown system state: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered_by_run_phase() {
        let mut sorted = SystemState::ALL;
        sorted.sort();
        assert_eq!(sorted, SystemState::ALL);
        assert!(SystemState::Steady < SystemState::Chaos);
        assert!(SystemState::Chaos < SystemState::Recovered);
    }

    #[test]
    fn serde_uses_document_names() {
        let json = serde_json::to_string(&SystemState::PostValidation).unwrap();
        assert_eq!(json, "\"POST_VALIDATION\"");

        let state: SystemState = serde_json::from_str("\"CHAOS\"").unwrap();
        assert_eq!(state, SystemState::Chaos);
    }

    #[test]
    fn from_str_is_lenient_on_case() {
        assert_eq!("steady".parse::<SystemState>(), Ok(SystemState::Steady));
        assert_eq!(
            "pre-validation".parse::<SystemState>(),
            Ok(SystemState::PreValidation)
        );
        assert!("broken".parse::<SystemState>().is_err());
    }
}
