//! Structural schema of the test plan document.
//!
//! [`TestPlan::schema`] derives a JSON Schema from the in-memory model. A
//! copy is published in `resources/schema.json` for external validators;
//! [`check_consistency`] compares the two in full, ignoring only
//! `description` text, so the published file cannot silently fall behind
//! the model. Regenerate it with
//! `fracture schema --output fracture-types/resources/schema.json`.

use serde_json::Value;
use thiserror::Error;

use crate::error::PlanError;
use crate::plan::TestPlan;

/// The schema shipped with this crate.
pub const PUBLISHED_SCHEMA: &str = include_str!("../resources/schema.json");

impl TestPlan {
    /// JSON Schema describing the plan document.
    pub fn schema() -> Result<Value, PlanError> {
        let root = schemars::schema_for!(TestPlan);
        let mut schema = serde_json::to_value(root)?;
        // A fresh id is generated per plan, so there is no fixed default.
        if let Some(id) = schema
            .pointer_mut("/properties/id")
            .and_then(Value::as_object_mut)
        {
            id.remove("default");
        }
        Ok(schema)
    }
}

/// Parse the published schema.
pub fn published_schema() -> Result<Value, PlanError> {
    Ok(serde_json::from_str(PUBLISHED_SCHEMA)?)
}

/// Differences between the model-derived schema and a published one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema drift: {}", .differences.join("; "))]
pub struct SchemaDrift {
    /// One line per difference.
    pub differences: Vec<String>,
}

/// Compare `published` against the schema derived from the current model.
pub fn check_consistency(published: &Value) -> Result<(), SchemaDrift> {
    let current = TestPlan::schema().map_err(|e| SchemaDrift {
        differences: vec![format!("cannot generate schema: {}", e)],
    })?;
    compare(&current, published)
}

/// Compare two schema documents.
///
/// Every keyword is compared (types, `$ref`, `items`, `format`, defaults,
/// `required`, `enum`, `additionalProperties`, definitions) except
/// `description`.
pub fn compare(expected: &Value, actual: &Value) -> Result<(), SchemaDrift> {
    let mut differences = Vec::new();
    diff("", expected, actual, &mut differences);
    differences.sort();
    if differences.is_empty() {
        Ok(())
    } else {
        Err(SchemaDrift { differences })
    }
}

const IGNORED_KEYWORDS: &[&str] = &["description"];

fn diff(path: &str, expected: &Value, actual: &Value, out: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, value) in expected {
                if IGNORED_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                let child = format!("{}/{}", path, key);
                match actual.get(key) {
                    Some(other) => diff(&child, value, other, out),
                    None => out.push(format!("{}: missing", child)),
                }
            }
            for key in actual.keys() {
                if !expected.contains_key(key) && !IGNORED_KEYWORDS.contains(&key.as_str()) {
                    out.push(format!("{}/{}: unexpected", path, key));
                }
            }
        }
        (Value::Array(expected), Value::Array(actual)) => {
            if expected.len() != actual.len() {
                out.push(format!(
                    "{}: expected {} items, found {}",
                    display_path(path),
                    expected.len(),
                    actual.len()
                ));
            }
            for (index, (value, other)) in expected.iter().zip(actual).enumerate() {
                diff(&format!("{}/{}", path, index), value, other, out);
            }
        }
        _ if expected != actual => out.push(format!(
            "{}: expected {}, found {}",
            display_path(path),
            expected,
            actual
        )),
        _ => {}
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
