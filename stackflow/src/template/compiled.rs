//! The rendered provider request body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::StackDefinition;

/// Template format version sent with every body.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Description used when a definition has none.
pub const DEFAULT_DESCRIPTION: &str = "Additional stack managed by stackflow";

/// A compiled template.
///
/// Field order is the serialized key order. Absent sections are left out
/// of the body entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledTemplate {
    /// Format version constant.
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    /// Template description.
    #[serde(rename = "Description")]
    pub description: String,

    /// `Metadata` section.
    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// `Parameters` section.
    #[serde(rename = "Parameters", default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    /// `Mappings` section.
    #[serde(rename = "Mappings", default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Value>,

    /// `Conditions` section.
    #[serde(rename = "Conditions", default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,

    /// `Transform` section.
    #[serde(rename = "Transform", default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,

    /// `Resources` section.
    #[serde(rename = "Resources", default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,

    /// `Outputs` section.
    #[serde(rename = "Outputs", default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
}

impl CompiledTemplate {
    /// Renders a definition into a template.
    #[must_use]
    pub fn from_definition(definition: &StackDefinition) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: definition
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            metadata: definition.metadata.clone(),
            parameters: definition.parameters.clone(),
            mappings: definition.mappings.clone(),
            conditions: definition.conditions.clone(),
            transform: definition.transform.clone(),
            resources: definition.resources.clone(),
            outputs: definition.outputs.clone(),
        }
    }

    /// Returns true if the template declares a `Transform` section.
    #[must_use]
    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Serializes the template as the compact request body.
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the template for humans.
    pub fn to_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_minimal_definition_renders_envelope_only() {
        let template = CompiledTemplate::from_definition(&StackDefinition::default());
        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": "Additional stack managed by stackflow"
            })
        );
    }

    #[test]
    fn test_missing_transform_is_omitted_from_body() {
        let definition = StackDefinition {
            resources: Some(json!({"Topic": {"Type": "AWS::SNS::Topic"}})),
            ..StackDefinition::default()
        };
        let template = CompiledTemplate::from_definition(&definition);
        let body = template.to_body().unwrap();

        assert!(!template.has_transform());
        assert!(!body.contains("Transform"));
        assert!(!body.contains("null"));
    }

    #[test]
    fn test_key_order_is_fixed() {
        let definition = StackDefinition {
            description: Some("Queues".into()),
            outputs: Some(json!({"Arn": {"Value": "x"}})),
            resources: Some(json!({"Q": {"Type": "AWS::SQS::Queue"}})),
            transform: Some(json!("AWS::Serverless-2016-10-31")),
            conditions: Some(json!({})),
            mappings: Some(json!({})),
            parameters: Some(json!({})),
            metadata: Some(json!({})),
            ..StackDefinition::default()
        };
        let body = CompiledTemplate::from_definition(&definition).to_body().unwrap();

        let keys = [
            "AWSTemplateFormatVersion",
            "Description",
            "Metadata",
            "Parameters",
            "Mappings",
            "Conditions",
            "Transform",
            "Resources",
            "Outputs",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| body.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{body}");
    }
}
