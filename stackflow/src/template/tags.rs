//! Stack tag construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The mandatory tag carrying the deployment stage.
pub const STAGE_TAG: &str = "STAGE";

/// A single provider tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// An insertion-ordered tag set with last-write-wins values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    /// Creates an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a tag, overwriting the value of an existing key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.tags.iter_mut().find(|t| t.key == key) {
            Some(tag) => tag.value = value,
            None => self.tags.push(Tag { key, value }),
        }
    }

    /// Merges a JSON tag object over this set.
    pub fn merge(&mut self, overrides: &Map<String, Value>) {
        for (key, value) in overrides {
            self.set(key.clone(), tag_value(value));
        }
    }

    /// Looks up a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Returns the tags as provider key/value pairs.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Tag> {
        self.tags.clone()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

fn tag_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds the tag set for one stack.
///
/// Starts from `STAGE=<stage>`. Stack tags are merged over it when the
/// definition has any; otherwise the provider-wide defaults are. Never both.
#[must_use]
pub fn build_tags(
    stage: &str,
    stack_tags: Option<&Map<String, Value>>,
    default_tags: Option<&Map<String, Value>>,
) -> TagSet {
    let mut tags = TagSet::new();
    tags.set(STAGE_TAG, stage);
    if let Some(overrides) = stack_tags.or(default_tags) {
        tags.merge(overrides);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_stage_only() {
        let tags = build_tags("dev", None, None);
        assert_eq!(tags.to_vec(), vec![Tag { key: "STAGE".into(), value: "dev".into() }]);
    }

    #[test]
    fn test_stack_tags_win_over_defaults() {
        let stack = object(json!({"Owner": "another@example.org"}));
        let defaults = object(json!({"Owner": "owner@example.org", "Team": "core"}));
        let tags = build_tags("dev", Some(&stack), Some(&defaults));

        assert_eq!(tags.get("Owner"), Some("another@example.org"));
        assert_eq!(tags.get("Team"), None, "defaults must not apply when stack tags exist");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_defaults_apply_without_stack_tags() {
        let defaults = object(json!({"Owner": "owner@example.org"}));
        let tags = build_tags("prod", None, Some(&defaults));
        assert_eq!(tags.get("STAGE"), Some("prod"));
        assert_eq!(tags.get("Owner"), Some("owner@example.org"));
    }

    #[test]
    fn test_stack_can_override_stage_in_place() {
        let stack = object(json!({"STAGE": "custom", "Cost": 42}));
        let tags = build_tags("dev", Some(&stack), None);
        let vec = tags.to_vec();
        assert_eq!(vec[0], Tag { key: "STAGE".into(), value: "custom".into() });
        assert_eq!(vec[1], Tag { key: "Cost".into(), value: "42".into() });
    }

    #[test]
    fn test_tag_serialize() {
        let json = serde_json::to_value(Tag { key: "K".into(), value: "V".into() }).unwrap();
        assert_eq!(json, json!({"Key": "K", "Value": "V"}));
    }
}
