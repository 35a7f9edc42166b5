//! Core domain model types for stackflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Provider status codes and their three-way classification
//! - Operation kinds and per-stack outcomes
//! - Progress events

mod event;
mod operation;
mod status;

pub use event::StackEvent;
pub use operation::{OperationKind, StackInfo, StackOutcome};
pub use status::{classify, OperationOutcome, StackStatus, UnknownStatusCode};
