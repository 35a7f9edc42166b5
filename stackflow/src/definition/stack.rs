//! The typed stack definition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// When a stack is deployed relative to the primary service stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeployTiming {
    /// Deployed before the primary stack (the default, also for a blank value).
    Before,
    /// Deployed after the primary stack.
    After,
    /// Any other value; only deployed on explicit request.
    Other(String),
}

impl Default for DeployTiming {
    fn default() -> Self {
        Self::Before
    }
}

impl From<String> for DeployTiming {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value.eq_ignore_ascii_case("before") {
            Self::Before
        } else if value.eq_ignore_ascii_case("after") {
            Self::After
        } else {
            Self::Other(value)
        }
    }
}

impl From<DeployTiming> for String {
    fn from(value: DeployTiming) -> Self {
        match value {
            DeployTiming::Before => "Before".to_string(),
            DeployTiming::After => "After".to_string(),
            DeployTiming::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DeployTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A parameter value passed on the create/update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployParameter {
    /// Template parameter name.
    pub parameter_key: String,
    /// Value to pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    /// Reuse the value from the previous deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_previous_value: Option<bool>,
}

impl DeployParameter {
    /// Creates a parameter with an explicit value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter_key: key.into(),
            parameter_value: Some(value.into()),
            use_previous_value: None,
        }
    }
}

/// A named, declarative description of one stack.
///
/// Keys follow the host document's PascalCase spelling. Template sections
/// are carried as opaque JSON and passed through to the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDefinition {
    /// Template description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Full remote name, overriding `<prefix>-<logical name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,

    /// Deployment timing; absent means [`DeployTiming::Before`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployTiming>,

    /// Stack-specific tags, merged over the `STAGE` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Map<String, Value>>,

    /// Parameters passed on the create/update call, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy_parameters: Vec<DeployParameter>,

    /// Template `Metadata` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Template `Parameters` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    /// Template `Mappings` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Value>,

    /// Template `Conditions` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,

    /// Template `Transform` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,

    /// Template `Resources` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,

    /// Template `Outputs` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
}

impl StackDefinition {
    /// Returns the effective deployment timing.
    #[must_use]
    pub fn timing(&self) -> DeployTiming {
        self.deploy.clone().unwrap_or_default()
    }

    /// Returns true if the stack is deployed before the primary stack.
    #[must_use]
    pub fn is_before(&self) -> bool {
        self.timing() == DeployTiming::Before
    }

    /// Returns true if the stack is deployed after the primary stack.
    #[must_use]
    pub fn is_after(&self) -> bool {
        self.timing() == DeployTiming::After
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timing_is_case_insensitive() {
        assert_eq!(DeployTiming::from("AFTER".to_string()), DeployTiming::After);
        assert_eq!(DeployTiming::from("before".to_string()), DeployTiming::Before);
        assert_eq!(
            DeployTiming::from("Manual".to_string()),
            DeployTiming::Other("Manual".to_string())
        );
    }

    #[test]
    fn test_absent_timing_means_before() {
        let def: StackDefinition = serde_json::from_value(json!({"Resources": {}})).unwrap();
        assert!(def.deploy.is_none());
        assert!(def.is_before());
        assert!(!def.is_after());
    }

    #[test]
    fn test_definition_deserializes_pascal_case() {
        let def: StackDefinition = serde_json::from_value(json!({
            "Deploy": "After",
            "StackName": "custom-name",
            "Description": "Queues",
            "Tags": {"Owner": "ops@example.org"},
            "DeployParameters": [
                {"ParameterKey": "TopicName", "ParameterValue": "events"}
            ],
            "Transform": "AWS::Serverless-2016-10-31",
            "Resources": {"Topic": {"Type": "AWS::SNS::Topic"}}
        }))
        .unwrap();

        assert!(def.is_after());
        assert_eq!(def.stack_name.as_deref(), Some("custom-name"));
        assert_eq!(def.deploy_parameters, vec![DeployParameter::new("TopicName", "events")]);
        assert!(def.transform.is_some());
        assert!(def.outputs.is_none());
    }

    #[test]
    fn test_non_object_tags_rejected() {
        let result: Result<StackDefinition, _> =
            serde_json::from_value(json!({"Tags": ["Owner"]}));
        assert!(result.is_err());
    }
}
