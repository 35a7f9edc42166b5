//! Testing utilities for stackflow.
//!
//! This module provides:
//! - A scripted provisioning API that replays status sequences
//! - Helpers for building stack sets from JSON literals

mod fixtures;
mod mocks;

pub use crate::events::CollectingEventSink;
pub use fixtures::{definition, stack_set};
pub use mocks::{ProviderCall, ScriptedProvider, ScriptedResponse};
