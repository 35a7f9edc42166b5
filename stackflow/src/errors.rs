//! Error types for stackflow.
//!
//! Two provider conditions are deliberately absent from this taxonomy:
//! "stack does not exist" on describe and "no updates are to be performed"
//! on update. Both are recognised by the predicates in
//! [`crate::provider::signatures`] and turned into ordinary outcomes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::core::OperationKind;
use crate::engine::BatchError;

/// The main error type for stackflow operations.
#[derive(Debug, Error)]
pub enum StackflowError {
    /// A stack definition is malformed.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// An explicitly named stack is not part of the resolved set.
    #[error("Additional stack not found: {name}")]
    StackNotFound {
        /// The requested logical name.
        name: String,
    },

    /// The provisioning API returned an unclassified failure.
    #[error("{0}")]
    ProviderRequest(#[from] ProviderError),

    /// The poller observed a terminal failure status.
    #[error("{0}")]
    StackOperationFailed(#[from] StackOperationFailedError),

    /// The provider reported a status code this engine does not know.
    #[error("Unknown stack status '{status}' reported for {stack}")]
    UnknownStatus {
        /// The full stack name.
        stack: String,
        /// The raw status code.
        status: String,
    },

    /// A bounded wait ran out before the stack settled.
    #[error("Timed out after {}s waiting for {kind} of stack {stack}", waited.as_secs())]
    Timeout {
        /// The full stack name.
        stack: String,
        /// The operation being awaited.
        kind: OperationKind,
        /// How long the poller waited.
        waited: Duration,
    },

    /// The orchestration was cancelled.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A batch stopped at a failing stack.
    #[error(transparent)]
    Batch(Box<BatchError>),
}

impl StackflowError {
    /// Creates a stack not found error.
    #[must_use]
    pub fn stack_not_found(name: impl Into<String>) -> Self {
        Self::StackNotFound { name: name.into() }
    }

    /// Returns true if this error ended a wait early rather than reporting
    /// a provider outcome.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Cancelled(_) | Self::Timeout { .. } => true,
            Self::Batch(err) => err.error.is_interrupted(),
            _ => false,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let kind = match self {
            Self::Configuration(err) => {
                map.insert("key".to_string(), serde_json::json!(err.key));
                "ConfigurationError"
            }
            Self::StackNotFound { name } => {
                map.insert("stack".to_string(), serde_json::json!(name));
                "StackNotFound"
            }
            Self::ProviderRequest(err) => {
                if let Some(ref code) = err.code {
                    map.insert("code".to_string(), serde_json::json!(code));
                }
                "ProviderRequestError"
            }
            Self::StackOperationFailed(err) => {
                map.insert("stack".to_string(), serde_json::json!(err.stack));
                map.insert("operation".to_string(), serde_json::json!(err.kind.to_string()));
                map.insert("status".to_string(), serde_json::json!(err.status));
                "StackOperationFailed"
            }
            Self::UnknownStatus { stack, status } => {
                map.insert("stack".to_string(), serde_json::json!(stack));
                map.insert("status".to_string(), serde_json::json!(status));
                "UnknownStatus"
            }
            Self::Timeout { stack, kind, waited } => {
                map.insert("stack".to_string(), serde_json::json!(stack));
                map.insert("operation".to_string(), serde_json::json!(kind.to_string()));
                map.insert("waited_seconds".to_string(), serde_json::json!(waited.as_secs_f64()));
                "Timeout"
            }
            Self::Cancelled(_) => "Cancelled",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
            Self::Batch(err) => {
                map.insert("stack".to_string(), serde_json::json!(err.stack));
                map.insert(
                    "completed".to_string(),
                    serde_json::json!(err.completed.len()),
                );
                "BatchError"
            }
        };
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

impl From<BatchError> for StackflowError {
    fn from(err: BatchError) -> Self {
        Self::Batch(Box::new(err))
    }
}

impl From<serde_json::Error> for StackflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for StackflowError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when a stack definition cannot be used.
#[derive(Debug, Clone, Error)]
#[error("Invalid definition for additional stack '{key}': {message}")]
pub struct ConfigurationError {
    /// The offending stack key.
    pub key: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a stack settles in a failure status.
#[derive(Debug, Clone, Error)]
#[error("Additional stack {stack} {kind} failed with status {status}")]
pub struct StackOperationFailedError {
    /// The full stack name.
    pub stack: String,
    /// The operation that failed.
    pub kind: OperationKind,
    /// The terminal status code.
    pub status: String,
}

impl StackOperationFailedError {
    /// Creates a new stack operation failure.
    #[must_use]
    pub fn new(stack: impl Into<String>, kind: OperationKind, status: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            kind,
            status: status.into(),
        }
    }
}

/// A failure reported by the provisioning API.
///
/// `code` carries the provider's structured error code when the transport
/// exposes one; `message` is the provider's free text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ProviderError {
    /// Structured error code, if any.
    #[serde(default)]
    pub code: Option<String>,
    /// Provider error text.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Sets the structured error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Result alias for stackflow operations.
pub type Result<T, E = StackflowError> = std::result::Result<T, E>;
