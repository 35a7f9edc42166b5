//! Deep merging of stack definition fragments.

use serde_json::{Map, Value};

use crate::errors::ConfigurationError;

/// Merges `overlay` into `base`.
///
/// Objects merge key by key, recursively. Any other value in `overlay`
/// replaces the value in `base`, arrays included.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let nested = value.is_object() && base_map.get(&key).is_some_and(Value::is_object);
                match base_map.get_mut(&key) {
                    Some(existing) if nested => deep_merge(existing, value),
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Merges an ordered list of fragments into one definition object.
///
/// Later fragments win on scalar collisions. Every fragment must be an
/// object; anything else is reported against `key`.
pub fn merge_fragments(key: &str, fragments: &[Value]) -> Result<Value, ConfigurationError> {
    let mut merged = Value::Object(Map::new());
    for (index, fragment) in fragments.iter().enumerate() {
        if !fragment.is_object() {
            return Err(ConfigurationError::new(
                key,
                format!(
                    "fragment {index} must be an object, found {}",
                    value_kind(fragment)
                ),
            ));
        }
        deep_merge(&mut merged, fragment.clone());
    }
    Ok(merged)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
