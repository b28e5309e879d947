//! Identity types for fracture test plans.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A stable identifier for one test plan instance.
///
/// A random v4 UUID is generated when a document omits the `id` field,
/// so every constructed plan carries one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestPlanId(Uuid);

impl TestPlanId {
    /// Create a new random TestPlanId.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TestPlanId {
    fn default() -> Self {
        Self::random()
    }
}

impl fmt::Display for TestPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TestPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestPlanId({})", &self.0.as_simple().to_string()[..8])
    }
}

impl FromStr for TestPlanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl JsonSchema for TestPlanId {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        "TestPlanId".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        let mut schema = String::json_schema(gen).into_object();
        schema.format = Some("uuid".to_string());
        schema.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_differ() {
        assert_ne!(TestPlanId::random(), TestPlanId::random());
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = TestPlanId::random();
        let parsed: TestPlanId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: TestPlanId = "6a2f41a3-c54c-fce8-32d2-0324e1c32e22".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6a2f41a3-c54c-fce8-32d2-0324e1c32e22\"");
    }

    #[test]
    fn debug_is_short() {
        let id = TestPlanId::random();
        assert_eq!(format!("{:?}", id).len(), "TestPlanId(".len() + 8 + 1);
    }
}
