//! Declarative stack definitions and their resolution into a stack set.
//!
//! This module provides:
//! - The typed [`StackDefinition`] read from the host configuration
//! - Left-to-right deep merging of fragment lists
//! - The insertion-ordered [`StackSet`] with timing views

mod merge;
mod set;
mod stack;

pub use merge::{deep_merge, merge_fragments};
pub use set::{resolve, StackSet};
pub use stack::{DeployParameter, DeployTiming, StackDefinition};
