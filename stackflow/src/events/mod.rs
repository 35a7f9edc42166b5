//! Event sinks for progress reporting.
//!
//! The engine never writes to stdout itself. Every user-visible progress
//! message is a [`StackEvent`](crate::core::StackEvent) handed to the sink
//! the caller supplied.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
