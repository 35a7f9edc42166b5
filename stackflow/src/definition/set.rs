//! Insertion-ordered stack sets.

use serde_json::{Map, Value};
use tracing::debug;

use super::merge::merge_fragments;
use super::stack::StackDefinition;
use crate::errors::{ConfigurationError, Result};

/// An insertion-ordered mapping of logical stack name to definition.
///
/// Filtering views return new sets and never mutate the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackSet {
    entries: Vec<(String, StackDefinition)>,
}

impl StackSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a stack, keeping the position of an existing name.
    pub fn insert(&mut self, name: impl Into<String>, definition: StackDefinition) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = definition;
        } else {
            self.entries.push((name, definition));
        }
    }

    /// Looks up a stack by logical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StackDefinition> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, definition)| definition)
    }

    /// Returns a set holding only `name`, if present.
    #[must_use]
    pub fn only(&self, name: &str) -> Option<Self> {
        self.get(name).map(|definition| Self {
            entries: vec![(name.to_string(), definition.clone())],
        })
    }

    /// Returns the full set.
    #[must_use]
    pub fn all(&self) -> Self {
        self.clone()
    }

    /// Stacks deployed before the primary stack.
    #[must_use]
    pub fn before(&self) -> Self {
        self.filter(StackDefinition::is_before)
    }

    /// Stacks deployed after the primary stack.
    #[must_use]
    pub fn after(&self) -> Self {
        self.filter(StackDefinition::is_after)
    }

    /// Returns the stacks matching `predicate`, in order.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&StackDefinition) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, definition)| predicate(definition))
                .cloned()
                .collect(),
        }
    }

    /// Logical names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &StackDefinition)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Iterates in reverse insertion order.
    pub fn iter_rev(&self) -> impl Iterator<Item = (&str, &StackDefinition)> {
        self.iter().rev()
    }

    /// Number of stacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, StackDefinition)> for StackSet {
    fn from_iter<I: IntoIterator<Item = (String, StackDefinition)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, definition) in iter {
            set.insert(name, definition);
        }
        set
    }
}

/// Resolves raw definitions into a typed stack set.
///
/// Each value is either a single object or an ordered list of fragments to
/// deep-merge. All entries are validated before anything is returned, so a
/// malformed definition is reported before any remote call.
pub fn resolve(raw: &Map<String, Value>) -> Result<StackSet> {
    let mut set = StackSet::new();
    for (name, value) in raw {
        let merged = match value {
            Value::Array(fragments) => merge_fragments(name, fragments)?,
            Value::Object(_) => value.clone(),
            Value::Null => Value::Object(Map::new()),
            other => {
                return Err(ConfigurationError::new(
                    name,
                    format!("expected an object or a list of objects, found {other}"),
                )
                .into());
            }
        };
        let definition: StackDefinition = serde_json::from_value(merged)
            .map_err(|e| ConfigurationError::new(name, e.to_string()))?;
        debug!(stack = %name, timing = %definition.timing(), "Resolved additional stack");
        set.insert(name.clone(), definition);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StackflowError;
    use crate::definition::DeployTiming;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_resolve_preserves_insertion_order() {
        let set = resolve(&raw(json!({
            "zeta": {"Resources": {}},
            "alpha": {"Resources": {}},
            "mid": {"Resources": {}}
        })))
        .unwrap();
        assert_eq!(set.names(), vec!["zeta", "alpha", "mid"]);
        let reversed: Vec<&str> = set.iter_rev().map(|(n, _)| n).collect();
        assert_eq!(reversed, vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_resolve_merges_fragment_lists() {
        let set = resolve(&raw(json!({
            "data": [
                {"Description": "first", "Resources": {"A": {"Type": "X"}}},
                {"Deploy": "after"},
                {"Description": "second"}
            ]
        })))
        .unwrap();
        let def = set.get("data").unwrap();
        assert_eq!(def.description.as_deref(), Some("second"));
        assert_eq!(def.deploy, Some(DeployTiming::After));
        assert_eq!(def.resources, Some(json!({"A": {"Type": "X"}})));
    }

    #[test]
    fn test_resolve_rejects_non_object_fragment() {
        let err = resolve(&raw(json!({
            "good": {},
            "bad": [{"Resources": {}}, 42]
        })))
        .unwrap_err();
        match err {
            StackflowError::Configuration(e) => assert_eq!(e.key, "bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_rejects_scalar_entry() {
        let err = resolve(&raw(json!({"bad": "text"}))).unwrap_err();
        assert!(matches!(err, StackflowError::Configuration(ref e) if e.key == "bad"));
    }

    #[test]
    fn test_timing_views_partition_the_set() {
        let set = resolve(&raw(json!({
            "entry1": {"Deploy": "After"},
            "entry2": {}
        })))
        .unwrap();

        let after = set.after();
        let before = set.before();
        assert_eq!(after.names(), vec!["entry1"]);
        assert_eq!(before.names(), vec!["entry2"]);

        let mut union: Vec<&str> = before.names();
        union.extend(after.names());
        union.sort_unstable();
        assert_eq!(union, vec!["entry1", "entry2"]);
        assert!(before.names().iter().all(|n| after.get(n).is_none()));
    }

    #[test]
    fn test_blank_timing_deploys_before() {
        let set = resolve(&raw(json!({
            "a": {"Deploy": ""},
            "b": {"Deploy": "   "},
            "c": {"Deploy": "After"}
        })))
        .unwrap();

        assert_eq!(set.before().names(), vec!["a", "b"]);
        assert_eq!(set.after().names(), vec!["c"]);
        assert_eq!(set.get("a").unwrap().timing(), DeployTiming::Before);
    }

    #[test]
    fn test_explicit_only_timing_is_in_neither_view() {
        let set = resolve(&raw(json!({
            "manual": {"Deploy": "Manual"},
            "auto": {"Deploy": "BEFORE"}
        })))
        .unwrap();
        assert_eq!(set.before().names(), vec!["auto"]);
        assert!(set.after().is_empty());
        assert_eq!(set.all().len(), 2);
    }

    #[test]
    fn test_lookup_of_missing_name_is_none() {
        let set = resolve(&raw(json!({"a": {}}))).unwrap();
        assert!(set.get("missing").is_none());
        assert!(set.only("missing").is_none());
        assert_eq!(set.only("a").unwrap().names(), vec!["a"]);
    }

    #[test]
    fn test_insert_keeps_position_on_replace() {
        let mut set: StackSet = vec![
            ("a".to_string(), StackDefinition::default()),
            ("b".to_string(), StackDefinition::default()),
        ]
        .into_iter()
        .collect();
        set.insert(
            "a",
            StackDefinition {
                description: Some("replaced".into()),
                ..StackDefinition::default()
            },
        );
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.get("a").unwrap().description.as_deref(), Some("replaced"));
    }
}
