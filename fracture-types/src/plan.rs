//! The test plan document.
//!
//! A [`TestPlan`] is validated eagerly: every constructor and loader either
//! returns a plan whose target definition, agents and verification entries
//! all resolve, or fails. Nothing is coerced or defaulted to a no-op.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::attack::AttackConfig;
use crate::error::PlanError;
use crate::ids::TestPlanId;
use crate::state::SystemState;
use crate::verification::VerificationConfig;

/// Serialization format for exported plan documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension (`.json` is JSON, anything else YAML).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => f.write_str("json"),
            DocumentFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(format!("unknown document format: {}", other)),
        }
    }
}

/// A chaos test plan: one attack and the checks that verify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TestPlan {
    /// Plan identifier, generated when absent from the document.
    #[serde(default)]
    pub id: TestPlanId,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Verification checks, in declaration order.
    #[serde(default)]
    pub verification: Vec<VerificationConfig>,

    /// The attack to run.
    pub attack: AttackConfig,
}

impl TestPlan {
    /// Build and validate a plan with a fresh id.
    pub fn new(
        description: &str,
        verification: Vec<VerificationConfig>,
        attack: AttackConfig,
    ) -> Result<Self, PlanError> {
        let plan = Self {
            id: TestPlanId::random(),
            description: description.to_string(),
            verification,
            attack,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check every invariant of the document.
    ///
    /// # Errors
    ///
    /// The first violation found: an invalid attack (target config, blast
    /// radius, agents), a verification entry without states, or an
    /// unsupported verification type.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.attack.validate()?;
        for (index, entry) in self.verification.iter().enumerate() {
            if entry.states.is_empty() {
                return Err(PlanError::EmptyStates { index });
            }
            entry.get_verification_config()?;
        }
        Ok(())
    }

    /// Verification entries scoped to `state`, in original order.
    pub fn filter_verification_by_state(&self, state: SystemState) -> Vec<&VerificationConfig> {
        self.verification
            .iter()
            .filter(|entry| entry.applies_to(state))
            .collect()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_json::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Parse and validate a YAML (or JSON) document.
    pub fn from_yaml_str(content: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_yaml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Parse and validate a document in the given format.
    pub fn from_document_str(content: &str, format: DocumentFormat) -> Result<Self, PlanError> {
        match format {
            DocumentFormat::Json => Self::from_json_str(content),
            DocumentFormat::Yaml => Self::from_yaml_str(content),
        }
    }

    /// Load and validate a plan file.
    ///
    /// Files ending in `.json` are parsed as JSON; everything else as YAML,
    /// which also accepts JSON documents.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_document_str(&content, DocumentFormat::from_path(path))
    }

    /// Serialize the plan.
    pub fn to_document_string(&self, format: DocumentFormat) -> Result<String, PlanError> {
        Ok(match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Write the plan to `path`. Loading the file again yields an equal plan.
    pub fn export_to_file(&self, path: impl AsRef<Path>, format: DocumentFormat) -> Result<(), PlanError> {
        let path = path.as_ref();
        let content = self.to_document_string(format)?;
        std::fs::write(path, content).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::AgentConfig;
    use crate::target::{MachineTargetDefinition, TargetType};
    use crate::verification::{PythonModuleVerification, Verification};
    use serde_json::json;
    use std::path::PathBuf;

    fn resources() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources/testplans")
    }

    fn mock_testplan() -> TestPlan {
        let target = MachineTargetDefinition::new(34)
            .with_hostnames([
                "mockhost1.yahoo.com",
                "mockhost2.yahoo.com",
                "mockhost3.yahoo.com",
            ])
            .with_hostpatterns(["web[01-05].fe.yahoo.com", "mockhost4.yahoo.com"]);

        TestPlan::new(
            "mock testplan",
            vec![
                VerificationConfig::new(
                    vec![SystemState::Steady, SystemState::Recovered],
                    "python_module",
                    json!({"path": "/directory/subdirectory/script.py"}),
                ),
                VerificationConfig::new(
                    vec![SystemState::Chaos],
                    "python_module",
                    json!({"path": "/directory/subdirectory/script.py"}),
                ),
            ],
            AttackConfig::new(
                TargetType::Machine,
                serde_json::to_value(&target).unwrap(),
                vec![AgentConfig::new("no_op", json!({"name": "no_op"}))],
            ),
        )
        .unwrap()
    }

    // ===========================================
    // Construction
    // ===========================================

    #[test]
    fn testplan_construction() {
        let plan = mock_testplan();
        assert_eq!(plan.verification.len(), 2);
        assert_eq!(plan.filter_verification_by_state(SystemState::Chaos).len(), 1);
        assert_eq!(plan.filter_verification_by_state(SystemState::Recovered).len(), 1);

        assert!(matches!(
            plan.verification[0].get_verification_config().unwrap(),
            Verification::PythonModule(PythonModuleVerification { .. })
        ));

        assert_eq!(plan.attack.agents.len(), 1);
        let crate::target::TargetDefinition::Machine(target) = plan.attack.get_target_config().unwrap();
        assert_eq!(
            target.hostnames,
            ["mockhost1.yahoo.com", "mockhost2.yahoo.com", "mockhost3.yahoo.com"]
        );
        assert_eq!(
            target.hostpatterns,
            ["web[01-05].fe.yahoo.com", "mockhost4.yahoo.com"]
        );
    }

    #[test]
    fn filter_returns_exact_entries_in_order() {
        let plan = mock_testplan();
        let chaos = plan.filter_verification_by_state(SystemState::Chaos);
        assert_eq!(chaos.len(), 1);
        assert!(std::ptr::eq(chaos[0], &plan.verification[1]));

        let steady = plan.filter_verification_by_state(SystemState::Steady);
        assert!(std::ptr::eq(steady[0], &plan.verification[0]));

        assert!(plan
            .filter_verification_by_state(SystemState::PostValidation)
            .is_empty());
    }

    #[test]
    fn unsupported_verification_type_fails_construction() {
        let plan = mock_testplan();
        let result = TestPlan::new(
            "bad",
            vec![VerificationConfig::new(
                vec![SystemState::Chaos],
                "does_not_exist",
                json!({}),
            )],
            plan.attack.clone(),
        );
        assert!(matches!(
            result,
            Err(PlanError::UnsupportedVerificationType(t)) if t == "does_not_exist"
        ));
    }

    #[test]
    fn empty_states_fail_construction() {
        let plan = mock_testplan();
        let result = TestPlan::new(
            "bad",
            vec![VerificationConfig::new(vec![], "python_module", json!({"path": "a.py"}))],
            plan.attack.clone(),
        );
        assert!(matches!(result, Err(PlanError::EmptyStates { index: 0 })));
    }

    #[test]
    fn missing_id_is_generated() {
        let doc = json!({
            "attack": {
                "target_type": "machine",
                "target_config": {"blast_radius": 10, "hostnames": ["a"]},
                "agents": [{"type": "no_op"}]
            }
        });
        let a = TestPlan::from_json_str(&doc.to_string()).unwrap();
        let b = TestPlan::from_json_str(&doc.to_string()).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.verification.is_empty());
        assert_eq!(a.description, "");
    }

    // ===========================================
    // Documents
    // ===========================================

    #[test]
    fn testplan_load_from_file() {
        let plan = TestPlan::load_file(resources().join("valid/testplan1.json")).unwrap();
        assert_eq!(plan.description, "A valid mock testplan file");
        assert_eq!(
            plan.id.to_string(),
            "6a2f41a3-c54c-4ce8-82d2-0324e1c32e22"
        );
    }

    #[test]
    fn yaml_and_json_fixtures_are_equivalent() {
        let json = TestPlan::load_file(resources().join("valid/testplan1.json")).unwrap();
        let yaml = TestPlan::load_file(resources().join("valid/testplan1.yaml")).unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn invalid_fixtures_are_rejected() {
        let dir = resources().join("invalid");
        let cases = [
            ("blast_radius_out_of_range.json", "blast radius"),
            ("unknown_verification_type.yaml", "unsupported verification type"),
            ("unknown_field.json", "unknown field"),
            ("no_agents.yaml", "at least one agent"),
        ];
        for (file, expected) in cases {
            let err = TestPlan::load_file(dir.join(file)).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{}: expected {:?} in {:?}",
                file,
                expected,
                err.to_string()
            );
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TestPlan::load_file("/nonexistent/plan.yaml").unwrap_err();
        assert!(matches!(err, PlanError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/plan.yaml"));
    }

    #[test]
    fn testplan_export_to_json_file() {
        let plan = mock_testplan();
        let file = tempfile::NamedTempFile::new().unwrap();

        plan.export_to_file(file.path(), DocumentFormat::Json).unwrap();
        let from_file = TestPlan::load_file(file.path()).unwrap();
        assert_eq!(plan, from_file);
    }

    #[test]
    fn testplan_export_to_yaml_file() {
        let plan = mock_testplan();
        let file = tempfile::NamedTempFile::new().unwrap();

        plan.export_to_file(file.path(), DocumentFormat::Yaml).unwrap();
        let from_file = TestPlan::load_file(file.path()).unwrap();
        assert_eq!(plan, from_file);
    }

    #[test]
    fn export_by_extension_roundtrip() {
        let plan = mock_testplan();
        let dir = tempfile::tempdir().unwrap();

        for name in ["plan.json", "plan.yaml", "plan.yml"] {
            let path = dir.path().join(name);
            plan.export_to_file(&path, DocumentFormat::from_path(&path)).unwrap();
            assert_eq!(TestPlan::load_file(&path).unwrap(), plan, "{}", name);
        }
    }

    #[test]
    fn document_format_parsing() {
        assert_eq!("JSON".parse::<DocumentFormat>(), Ok(DocumentFormat::Json));
        assert_eq!("yml".parse::<DocumentFormat>(), Ok(DocumentFormat::Yaml));
        assert!("toml".parse::<DocumentFormat>().is_err());
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a")), DocumentFormat::Yaml);
    }
}
