//! Progress events emitted while stacks are being driven.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{OperationKind, StackStatus};

/// A progress event for one stack.
///
/// Events are delivered to an [`EventSink`](crate::events::EventSink) in the
/// order they happen, so a sink sees a human-readable account of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEvent {
    /// The event type (e.g., "stack.create.started").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// Logical stack name.
    pub stack: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StackEvent {
    /// Creates a new stack event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            stack: stack.into(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Creates a "stack.<op>.started" event, emitted before a mutating call.
    #[must_use]
    pub fn started(stack: &str, kind: OperationKind, full_name: &str) -> Self {
        Self::new(format!("stack.{kind}.started"), stack)
            .add_data("full_name", serde_json::json!(full_name))
    }

    /// Creates a "stack.<op>.completed" event.
    #[must_use]
    pub fn completed(stack: &str, kind: OperationKind, status: StackStatus) -> Self {
        Self::new(format!("stack.{kind}.completed"), stack)
            .add_data("status", serde_json::json!(status.as_str()))
    }

    /// Creates a "stack.<op>.failed" event.
    #[must_use]
    pub fn failed(stack: &str, kind: OperationKind, error: &str) -> Self {
        Self::new(format!("stack.{kind}.failed"), stack).add_data("error", serde_json::json!(error))
    }

    /// Creates a "stack.poll.in_progress" event, emitted once per wait cycle.
    #[must_use]
    pub fn polling(stack: &str, kind: OperationKind, status: StackStatus, attempt: u32) -> Self {
        Self::new("stack.poll.in_progress", stack)
            .add_data("operation", serde_json::json!(kind.to_string()))
            .add_data("status", serde_json::json!(status.as_str()))
            .add_data("attempt", serde_json::json!(attempt))
    }

    /// Creates a "stack.unchanged" event.
    #[must_use]
    pub fn unchanged(stack: &str) -> Self {
        Self::new("stack.unchanged", stack)
    }

    /// Creates a "stack.skipped" event.
    #[must_use]
    pub fn skipped(stack: &str, reason: &str) -> Self {
        Self::new("stack.skipped", stack).add_data("reason", serde_json::json!(reason))
    }

    /// Creates a "run.cancelled" event, emitted once when a run is interrupted.
    ///
    /// The event is not tied to one stack, so `stack` is empty.
    #[must_use]
    pub fn cancelled(run_id: uuid::Uuid) -> Self {
        Self::new("run.cancelled", "").add_data("run_id", serde_json::json!(run_id.to_string()))
    }

    /// Creates a "stack.template.written" event.
    #[must_use]
    pub fn template_written(stack: &str, path: &std::path::Path) -> Self {
        Self::new("stack.template.written", stack)
            .add_data("path", serde_json::json!(path.display().to_string()))
    }

    /// Returns a one-line human-readable rendering.
    #[must_use]
    pub fn message(&self) -> String {
        let detail = |key: &str| {
            self.data
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        match self.event_type.as_str() {
            "stack.create.started" => format!("Creating additional stack {}...", self.stack),
            "stack.update.started" => format!("Updating additional stack {}...", self.stack),
            "stack.delete.started" => format!("Removing additional stack {}...", self.stack),
            "stack.create.completed" | "stack.update.completed" | "stack.delete.completed" => {
                format!("Additional stack {} {}", self.stack, detail("status"))
            }
            "stack.poll.in_progress" => {
                format!("Waiting for additional stack {} ({})", self.stack, detail("status"))
            }
            "stack.unchanged" => format!("Additional stack {} has not changed.", self.stack),
            "stack.skipped" => format!("Skipping additional stack {}: {}", self.stack, detail("reason")),
            "stack.template.written" => {
                format!("Wrote template for {} to {}", self.stack, detail("path"))
            }
            "run.cancelled" => "Interrupted, stopping at the next status check".to_string(),
            other if other.ends_with(".failed") => {
                format!("Additional stack {} failed: {}", self.stack, detail("error"))
            }
            other => format!("{other} {}", self.stack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_event() {
        let event = StackEvent::started("data", OperationKind::Create, "svc-dev-data");
        assert_eq!(event.event_type, "stack.create.started");
        assert_eq!(event.stack, "data");
        assert_eq!(event.data.get("full_name"), Some(&serde_json::json!("svc-dev-data")));
        assert_eq!(event.message(), "Creating additional stack data...");
    }

    #[test]
    fn test_polling_event() {
        let event = StackEvent::polling("data", OperationKind::Update, StackStatus::UpdateInProgress, 3);
        assert_eq!(event.event_type, "stack.poll.in_progress");
        assert_eq!(event.data.get("attempt"), Some(&serde_json::json!(3)));
        assert_eq!(event.message(), "Waiting for additional stack data (UPDATE_IN_PROGRESS)");
    }

    #[test]
    fn test_failed_event_message() {
        let event = StackEvent::failed("data", OperationKind::Delete, "DELETE_FAILED");
        assert_eq!(event.event_type, "stack.delete.failed");
        assert_eq!(event.message(), "Additional stack data failed: DELETE_FAILED");
    }

    #[test]
    fn test_cancelled_event_carries_run_id() {
        let run_id = uuid::Uuid::new_v4();
        let event = StackEvent::cancelled(run_id);
        assert_eq!(event.event_type, "run.cancelled");
        assert_eq!(event.data.get("run_id"), Some(&serde_json::json!(run_id.to_string())));
        assert_eq!(event.message(), "Interrupted, stopping at the next status check");
    }

    #[test]
    fn test_event_serialize() {
        let event = StackEvent::unchanged("data");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stack.unchanged");
        assert_eq!(json["stack"], "data");
    }
}
