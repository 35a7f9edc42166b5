//! Configuration types.
//!
//! [`ServiceConfig`] is the host configuration document the stacks are
//! declared in. [`EngineSettings`] holds the run-time knobs of the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::PollerConfig;
use crate::errors::{ConfigurationError, Result, StackflowError};
use crate::template::CompileContext;

/// Stage used when neither the command line nor the document sets one.
pub const DEFAULT_STAGE: &str = "dev";

/// The host configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name; the first half of every derived stack name.
    pub service: String,
    /// Provider settings.
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Plugin-owned settings.
    #[serde(default)]
    pub custom: CustomSettings,
}

/// The `provider` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Deployment stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Target region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Tags applied to stacks that declare none of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_tags: Option<Map<String, Value>>,
    /// Provisioning gateway URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// The `custom` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSettings {
    /// Raw, unresolved stack definitions in declaration order.
    #[serde(default)]
    pub additional_stacks: Map<String, Value>,
}

impl ServiceConfig {
    /// Reads a YAML or JSON document from disk.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Parses a YAML document.
    ///
    /// The document is converted to JSON values so `additionalStacks` keeps
    /// its declaration order. Short-form intrinsics such as `!Ref` and
    /// `!GetAtt` are rewritten to their long form.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        Ok(serde_json::from_value(yaml_to_json(value)?)?)
    }

    /// Returns the effective stage; `override_stage` wins.
    #[must_use]
    pub fn stage(&self, override_stage: Option<&str>) -> String {
        override_stage
            .or(self.provider.stage.as_deref())
            .unwrap_or(DEFAULT_STAGE)
            .to_string()
    }

    /// Returns the primary-stack prefix, `<service>-<stage>`.
    #[must_use]
    pub fn prefix(&self, override_stage: Option<&str>) -> String {
        format!("{}-{}", self.service, self.stage(override_stage))
    }

    /// Builds the compile context for a run.
    pub fn compile_context(&self, override_stage: Option<&str>) -> Result<CompileContext> {
        if self.service.trim().is_empty() {
            return Err(ConfigurationError::new("service", "service name must not be empty").into());
        }
        let ctx = CompileContext::new(self.stage(override_stage), self.prefix(override_stage));
        Ok(match self.provider.stack_tags {
            Some(ref tags) => ctx.with_default_tags(tags.clone()),
            None => ctx,
        })
    }
}

/// Run-time settings for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Delay between status queries.
    pub poll_interval: Duration,
    /// Maximum wait per stack operation.
    pub max_wait: Option<Duration>,
    /// Maximum number of delay cycles per stack operation.
    pub max_attempts: Option<u32>,
    /// Directory compiled templates are written to.
    pub template_dir: Option<PathBuf>,
    /// Compile only; make no remote mutation.
    pub dry_run: bool,
    /// Turn every command into a no-op.
    pub skip: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: crate::engine::DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_attempts: None,
            template_dir: None,
            dry_run: false,
            skip: false,
        }
    }
}

impl EngineSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the maximum wait per operation.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sets the maximum number of delay cycles per operation.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the template output directory.
    #[must_use]
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Enables or disables dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables skipping.
    #[must_use]
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Returns the poller configuration.
    #[must_use]
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            max_wait: self.max_wait,
            max_attempts: self.max_attempts,
        }
    }
}

/// Converts a YAML value to JSON, expanding CloudFormation short-form tags.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => serde_json::to_value(&number)?,
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut out = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(text) => text,
                    Yaml::Number(number) => number.to_string(),
                    Yaml::Bool(flag) => flag.to_string(),
                    other => {
                        return Err(StackflowError::Serialization(format!(
                            "unsupported mapping key: {other:?}"
                        )))
                    }
                };
                out.insert(key, yaml_to_json(value)?);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let inner = yaml_to_json(tagged.value)?;
            let (key, inner) = match name {
                "Ref" | "Condition" => (name.to_string(), inner),
                "GetAtt" => (format!("Fn::{name}"), split_get_att(inner)),
                _ => (format!("Fn::{name}"), inner),
            };
            let mut out = Map::with_capacity(1);
            out.insert(key, inner);
            Value::Object(out)
        }
    })
}

/// `!GetAtt Resource.Attribute` is shorthand for `[Resource, Attribute]`.
fn split_get_att(value: Value) -> Value {
    match value {
        Value::String(text) => match text.split_once('.') {
            Some((resource, attribute)) => Value::Array(vec![
                Value::String(resource.to_string()),
                Value::String(attribute.to_string()),
            ]),
            None => Value::String(text),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    const DOC: &str = r"
service: orders
provider:
  stage: test
  region: eu-west-1
  stackTags:
    Owner: owner@example.org
custom:
  additionalStacks:
    zeta:
      Resources: {}
    alpha:
      Deploy: After
      Resources: {}
";

    #[test]
    fn test_yaml_keeps_declaration_order() {
        let config = ServiceConfig::from_yaml(DOC).unwrap();
        let names: Vec<&str> = config
            .custom
            .additional_stacks
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.provider.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_yaml_short_form_intrinsics() {
        let doc = r"
service: orders
custom:
  additionalStacks:
    data:
      Resources:
        Topic:
          Type: AWS::SNS::Topic
        Queue:
          Type: AWS::SQS::Queue
          Properties:
            QueueName: !Sub '${AWS::StackName}-queue'
            Tags:
              - Key: topic
                Value: !GetAtt [Topic, TopicName]
      Outputs:
        TopicRef:
          Value: !Ref Topic
        TopicArn:
          Value: !GetAtt Topic.Arn
";
        let config = ServiceConfig::from_yaml(doc).unwrap();
        let data = &config.custom.additional_stacks["data"];

        assert_eq!(data["Outputs"]["TopicRef"]["Value"], json!({"Ref": "Topic"}));
        assert_eq!(
            data["Outputs"]["TopicArn"]["Value"],
            json!({"Fn::GetAtt": ["Topic", "Arn"]})
        );
        let queue = &data["Resources"]["Queue"]["Properties"];
        assert_eq!(
            queue["QueueName"],
            json!({"Fn::Sub": "${AWS::StackName}-queue"})
        );
        assert_eq!(
            queue["Tags"][0]["Value"],
            json!({"Fn::GetAtt": ["Topic", "TopicName"]})
        );

        let keys: Vec<&str> = data["Resources"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["Topic", "Queue"]);
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let doc = "service: orders\ncustom:\n  additionalStacks:\n    a:\n      Mappings:\n        8080: open\n";
        let config = ServiceConfig::from_yaml(doc).unwrap();
        assert_eq!(
            config.custom.additional_stacks["a"]["Mappings"],
            json!({"8080": "open"})
        );
    }

    #[test]
    fn test_stage_override_wins() {
        let config = ServiceConfig::from_yaml(DOC).unwrap();
        assert_eq!(config.stage(None), "test");
        assert_eq!(config.stage(Some("prod")), "prod");
        assert_eq!(config.prefix(Some("prod")), "orders-prod");
    }

    #[test]
    fn test_default_stage() {
        let config = ServiceConfig::from_yaml("service: orders").unwrap();
        assert_eq!(config.stage(None), DEFAULT_STAGE);
        assert!(config.custom.additional_stacks.is_empty());
    }

    #[test]
    fn test_compile_context_carries_default_tags() {
        let ctx = ServiceConfig::from_yaml(DOC).unwrap().compile_context(None).unwrap();
        assert_eq!(ctx.prefix, "orders-test");
        assert_eq!(
            ctx.default_tags.unwrap().get("Owner"),
            Some(&Value::String("owner@example.org".into()))
        );
    }

    #[test]
    fn test_empty_service_rejected() {
        let err = ServiceConfig::default().compile_context(None).unwrap_err();
        assert!(err.to_string().contains("service"));
    }

    #[test]
    fn test_from_path_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"service": "orders", "custom": {{"additionalStacks": {{"b": {{}}, "a": {{}}}}}}}}"#
        )
        .unwrap();

        let config = ServiceConfig::from_path(file.path()).unwrap();
        let names: Vec<&String> = config.custom.additional_stacks.keys().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_settings_to_poller_config() {
        let settings = EngineSettings::new()
            .with_poll_interval(Duration::from_secs(1))
            .with_max_wait(Some(Duration::from_secs(60)));
        let poller = settings.poller_config();
        assert_eq!(poller.interval, Duration::from_secs(1));
        assert_eq!(poller.max_wait, Some(Duration::from_secs(60)));
        assert_eq!(poller.max_attempts, None);
    }
}
