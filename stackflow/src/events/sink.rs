//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, warn, Level};

use crate::core::StackEvent;

/// Trait for sinks that receive stack progress events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: StackEvent);

    /// Tries to emit an event without blocking.
    ///
    /// Used from synchronous contexts such as cancellation callbacks. This
    /// method should never fail. Errors are logged but suppressed.
    fn try_emit(&self, event: StackEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: StackEvent) {}

    fn try_emit(&self, _event: StackEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &StackEvent) {
        let message = event.message();
        if event.event_type.ends_with(".failed") || event.event_type.ends_with(".cancelled") {
            warn!(event_type = %event.event_type, stack = %event.stack, "{}", message);
            return;
        }
        match self.level {
            Level::DEBUG | Level::TRACE => {
                debug!(event_type = %event.event_type, stack = %event.stack, "{}", message);
            }
            _ => {
                info!(event_type = %event.event_type, stack = %event.stack, "{}", message);
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: StackEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: StackEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<StackEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<StackEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<StackEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: StackEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: StackEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OperationKind, StackStatus};

    #[tokio::test]
    async fn test_noop_and_logging_sinks_accept_events() {
        NoOpEventSink.emit(StackEvent::unchanged("a")).await;
        let sink = LoggingEventSink::default();
        sink.emit(StackEvent::started("a", OperationKind::Create, "svc-a")).await;
        sink.try_emit(StackEvent::failed("a", OperationKind::Create, "boom"));
    }

    #[tokio::test]
    async fn test_collecting_sink_preserves_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(StackEvent::started("a", OperationKind::Update, "svc-a")).await;
        sink.try_emit(StackEvent::completed("a", OperationKind::Update, StackStatus::UpdateComplete));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.event_types(),
            vec!["stack.update.started", "stack.update.completed"]
        );
    }

    #[tokio::test]
    async fn test_collecting_sink_filter_and_clear() {
        let sink = CollectingEventSink::new();
        sink.emit(StackEvent::polling("a", OperationKind::Create, StackStatus::CreateInProgress, 1))
            .await;
        sink.emit(StackEvent::polling("a", OperationKind::Create, StackStatus::CreateInProgress, 2))
            .await;
        sink.emit(StackEvent::unchanged("b")).await;

        assert_eq!(sink.events_of_type("stack.poll.").len(), 2);
        assert_eq!(sink.events_of_type("stack.unchanged").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
