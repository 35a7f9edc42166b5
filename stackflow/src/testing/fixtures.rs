//! Fixture builders.

use serde_json::Value;

use crate::definition::{resolve, StackDefinition, StackSet};
use crate::errors::Result;

/// Resolves a stack set from a JSON object literal.
///
/// Non-object input resolves to an empty set.
pub fn stack_set(raw: &Value) -> Result<StackSet> {
    match raw.as_object() {
        Some(map) => resolve(map),
        None => Ok(StackSet::new()),
    }
}

/// Builds a definition with one placeholder resource and the given timing.
#[must_use]
pub fn definition(deploy: Option<&str>) -> StackDefinition {
    StackDefinition {
        deploy: deploy.map(|d| d.to_string().into()),
        resources: Some(serde_json::json!({
            "Topic": {"Type": "AWS::SNS::Topic"}
        })),
        ..StackDefinition::default()
    }
}
