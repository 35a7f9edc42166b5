//! Operation kinds and per-stack outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StackStatus;

/// The kind of remote mutation being awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// A create request.
    Create,
    /// An update request.
    Update,
    /// A delete request.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// What happened to a single stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StackOutcome {
    /// The stack was created.
    Created {
        /// Terminal status reported by the provider.
        status: StackStatus,
    },
    /// The stack was updated.
    Updated {
        /// Terminal status reported by the provider.
        status: StackStatus,
    },
    /// The provider reported nothing to update.
    Unchanged,
    /// The stack was deleted.
    Deleted,
    /// There was nothing to delete.
    Absent,
    /// No remote call was made.
    Skipped {
        /// Why the stack was skipped.
        reason: String,
    },
    /// Status was read without mutating anything.
    Described(StackInfo),
}

impl StackOutcome {
    /// Returns true if the remote stack was changed.
    #[must_use]
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Updated { .. } | Self::Deleted
        )
    }
}

impl fmt::Display for StackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { status } => write!(f, "created ({status})"),
            Self::Updated { status } => write!(f, "updated ({status})"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Deleted => write!(f, "deleted"),
            Self::Absent => write!(f, "does not exist"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Described(info) => write!(f, "{info}"),
        }
    }
}

/// Snapshot of one stack for the info command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInfo {
    /// Logical name from the configuration.
    pub name: String,
    /// Full remote stack name.
    pub full_name: String,
    /// Raw provider status, or `None` if the stack does not exist.
    pub status: Option<String>,
}

impl fmt::Display for StackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(ref status) => write!(f, "{}: {} ({status})", self.name, self.full_name),
            None => write!(f, "{}: {} (does not exist)", self.name, self.full_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Create.to_string(), "create");
        assert_eq!(OperationKind::Update.to_string(), "update");
        assert_eq!(OperationKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_outcome_is_change() {
        assert!(StackOutcome::Created {
            status: StackStatus::CreateComplete
        }
        .is_change());
        assert!(StackOutcome::Deleted.is_change());
        assert!(!StackOutcome::Unchanged.is_change());
        assert!(!StackOutcome::Skipped {
            reason: "dry run".into()
        }
        .is_change());
    }

    #[test]
    fn test_stack_info_display() {
        let info = StackInfo {
            name: "data".into(),
            full_name: "svc-dev-data".into(),
            status: Some("CREATE_COMPLETE".into()),
        };
        assert_eq!(info.to_string(), "data: svc-dev-data (CREATE_COMPLETE)");

        let missing = StackInfo {
            status: None,
            ..info
        };
        assert_eq!(missing.to_string(), "data: svc-dev-data (does not exist)");
    }

    #[test]
    fn test_outcome_serialize() {
        let json = serde_json::to_value(StackOutcome::Updated {
            status: StackStatus::UpdateComplete,
        })
        .unwrap();
        assert_eq!(json["outcome"], "updated");
        assert_eq!(json["status"], "UPDATE_COMPLETE");
    }
}
