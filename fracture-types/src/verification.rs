//! Verification checks bound to system states.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::error::PlanError;
use crate::state::SystemState;

/// A verification check as written in a test plan document.
///
/// `config` is kept opaque until [`VerificationConfig::get_verification_config`]
/// resolves it into the variant selected by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// System states in which this check runs. A single state is accepted
    /// in documents and normalised to a list.
    #[serde(deserialize_with = "one_or_many")]
    #[schemars(with = "SystemStates")]
    pub states: Vec<SystemState>,

    /// Verification type discriminator, e.g. `python_module`.
    #[serde(rename = "type")]
    pub verification_type: String,

    /// Type-specific settings.
    pub config: serde_json::Value,
}

impl VerificationConfig {
    /// Create a verification config.
    pub fn new(states: Vec<SystemState>, verification_type: &str, config: serde_json::Value) -> Self {
        Self {
            states,
            verification_type: verification_type.to_string(),
            config,
        }
    }

    /// Returns true if this check is scoped to `state`.
    pub fn applies_to(&self, state: SystemState) -> bool {
        self.states.contains(&state)
    }

    /// Resolve `config` into the strongly-shaped variant selected by `type`.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnsupportedVerificationType`] if `type` has no registered
    /// variant; [`PlanError::InvalidVerificationConfig`] if `config` does not
    /// match that variant's shape.
    pub fn get_verification_config(&self) -> Result<Verification, PlanError> {
        let (_, construct) = VERIFICATION_TYPES
            .iter()
            .find(|(name, _)| *name == self.verification_type)
            .ok_or_else(|| PlanError::UnsupportedVerificationType(self.verification_type.clone()))?;

        construct(&self.config).map_err(|source| PlanError::InvalidVerificationConfig {
            kind: self.verification_type.clone(),
            source,
        })
    }
}

type VerificationConstructor = fn(&serde_json::Value) -> Result<Verification, serde_json::Error>;

/// Registered verification types.
const VERIFICATION_TYPES: &[(&str, VerificationConstructor)] = &[
    ("python_module", python_module),
    ("http_request", http_request),
];

fn python_module(config: &serde_json::Value) -> Result<Verification, serde_json::Error> {
    serde_json::from_value(config.clone()).map(Verification::PythonModule)
}

fn http_request(config: &serde_json::Value) -> Result<Verification, serde_json::Error> {
    serde_json::from_value(config.clone()).map(Verification::HttpRequest)
}

/// Names of all registered verification types.
pub fn verification_types() -> impl Iterator<Item = &'static str> {
    VERIFICATION_TYPES.iter().map(|(name, _)| *name)
}

/// A resolved verification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Run a Python script and check its exit status.
    PythonModule(PythonModuleVerification),
    /// Issue an HTTP request and check the response status.
    HttpRequest(HttpRequestVerification),
}

/// Settings for a `python_module` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PythonModuleVerification {
    /// Path of the script to run.
    pub path: PathBuf,
    /// Arguments passed to the script.
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// Settings for an `http_request` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpRequestVerification {
    /// URL to request.
    pub url: String,
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
    /// Status codes counted as healthy (default: 200).
    #[serde(default = "default_status_codes")]
    pub status_codes: Vec<u16>,
    /// Request timeout in milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status_codes() -> Vec<u16> {
    vec![200]
}

fn default_timeout_ms() -> u64 {
    5000
}

/// One state or a list of states, as accepted in documents.
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum SystemStates {
    One(SystemState),
    Many(Vec<SystemState>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<SystemState>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match SystemStates::deserialize(deserializer)? {
        SystemStates::One(state) => vec![state],
        SystemStates::Many(states) => states,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_python_module() {
        let config = VerificationConfig::new(
            vec![SystemState::Steady],
            "python_module",
            json!({"path": "/directory/subdirectory/script.py"}),
        );
        let resolved = config.get_verification_config().unwrap();
        assert_eq!(
            resolved,
            Verification::PythonModule(PythonModuleVerification {
                path: PathBuf::from("/directory/subdirectory/script.py"),
                arguments: vec![],
            })
        );
    }

    #[test]
    fn resolves_http_request_with_defaults() {
        let config = VerificationConfig::new(
            vec![SystemState::Chaos],
            "http_request",
            json!({"url": "https://service.example.com/health"}),
        );
        match config.get_verification_config().unwrap() {
            Verification::HttpRequest(http) => {
                assert_eq!(http.method, "GET");
                assert_eq!(http.status_codes, vec![200]);
                assert_eq!(http.timeout_ms, 5000);
            }
            other => panic!("expected http_request, got {:?}", other),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let config = VerificationConfig::new(vec![SystemState::Chaos], "shell_script", json!({}));
        let err = config.get_verification_config().unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedVerificationType(t) if t == "shell_script"));
    }

    #[test]
    fn mismatched_config_is_rejected() {
        let config = VerificationConfig::new(
            vec![SystemState::Chaos],
            "python_module",
            json!({"url": "http://x"}),
        );
        let err = config.get_verification_config().unwrap_err();
        assert!(matches!(err, PlanError::InvalidVerificationConfig { .. }));
    }

    #[test]
    fn single_state_is_normalised_to_list() {
        let config: VerificationConfig = serde_json::from_value(json!({
            "states": "CHAOS",
            "type": "python_module",
            "config": {"path": "a.py"}
        }))
        .unwrap();
        assert_eq!(config.states, vec![SystemState::Chaos]);

        let out = serde_json::to_value(&config).unwrap();
        assert_eq!(out["states"], json!(["CHAOS"]));
    }

    #[test]
    fn applies_to_checks_membership() {
        let config = VerificationConfig::new(
            vec![SystemState::Steady, SystemState::Recovered],
            "python_module",
            json!({"path": "a.py"}),
        );
        assert!(config.applies_to(SystemState::Recovered));
        assert!(!config.applies_to(SystemState::Chaos));
    }

    #[test]
    fn registered_types() {
        let names: Vec<_> = verification_types().collect();
        assert_eq!(names, ["python_module", "http_request"]);
    }
}
