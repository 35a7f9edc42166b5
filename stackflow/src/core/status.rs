//! Provider status codes and their classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Abstract outcome of a provider status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The requested operation finished and took effect.
    Success,
    /// The operation failed or was rolled back.
    Failure,
    /// The provider is still working.
    InProgress,
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::InProgress => write!(f, "in_progress"),
        }
    }
}

macro_rules! stack_statuses {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// Every status code the provisioning API can report for a stack.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[allow(missing_docs)]
        pub enum StackStatus {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl StackStatus {
            /// All known statuses, in provider documentation order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the provider's wire code.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl FromStr for StackStatus {
            type Err = UnknownStatusCode;

            fn from_str(code: &str) -> Result<Self, Self::Err> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    other => Err(UnknownStatusCode(other.to_string())),
                }
            }
        }
    };
}

stack_statuses! {
    CreateInProgress => "CREATE_IN_PROGRESS",
    CreateFailed => "CREATE_FAILED",
    CreateComplete => "CREATE_COMPLETE",
    RollbackInProgress => "ROLLBACK_IN_PROGRESS",
    RollbackFailed => "ROLLBACK_FAILED",
    RollbackComplete => "ROLLBACK_COMPLETE",
    DeleteInProgress => "DELETE_IN_PROGRESS",
    DeleteFailed => "DELETE_FAILED",
    DeleteComplete => "DELETE_COMPLETE",
    UpdateInProgress => "UPDATE_IN_PROGRESS",
    UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    UpdateComplete => "UPDATE_COMPLETE",
    UpdateFailed => "UPDATE_FAILED",
    UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
    UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
    UpdateRollbackCompleteCleanupInProgress => "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
    UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
    ReviewInProgress => "REVIEW_IN_PROGRESS",
    ImportInProgress => "IMPORT_IN_PROGRESS",
    ImportComplete => "IMPORT_COMPLETE",
    ImportRollbackInProgress => "IMPORT_ROLLBACK_IN_PROGRESS",
    ImportRollbackFailed => "IMPORT_ROLLBACK_FAILED",
    ImportRollbackComplete => "IMPORT_ROLLBACK_COMPLETE",
}

/// A status code outside the provider's documented set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatusCode(pub String);

impl fmt::Display for UnknownStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stack status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatusCode {}

impl StackStatus {
    /// Classifies the status.
    ///
    /// Rolled-back states count as failures: the provider undid the change
    /// that was asked for.
    #[must_use]
    pub const fn outcome(&self) -> OperationOutcome {
        match self {
            Self::CreateComplete
            | Self::UpdateComplete
            | Self::DeleteComplete
            | Self::ImportComplete => OperationOutcome::Success,

            Self::CreateInProgress
            | Self::RollbackInProgress
            | Self::DeleteInProgress
            | Self::UpdateInProgress
            | Self::UpdateCompleteCleanupInProgress
            | Self::UpdateRollbackInProgress
            | Self::UpdateRollbackCompleteCleanupInProgress
            | Self::ReviewInProgress
            | Self::ImportInProgress
            | Self::ImportRollbackInProgress => OperationOutcome::InProgress,

            Self::CreateFailed
            | Self::RollbackFailed
            | Self::RollbackComplete
            | Self::DeleteFailed
            | Self::UpdateFailed
            | Self::UpdateRollbackFailed
            | Self::UpdateRollbackComplete
            | Self::ImportRollbackFailed
            | Self::ImportRollbackComplete => OperationOutcome::Failure,
        }
    }

    /// Returns true if the provider is still working on the stack.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self.outcome(), OperationOutcome::InProgress)
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a raw provider status code.
pub fn classify(code: &str) -> Result<OperationOutcome, UnknownStatusCode> {
    code.parse::<StackStatus>().map(|status| status.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_round_trips_its_code() {
        for status in StackStatus::ALL {
            assert_eq!(status.as_str().parse::<StackStatus>().unwrap(), *status);
        }
        assert_eq!(StackStatus::ALL.len(), 23);
    }

    #[test]
    fn test_classification_is_partitioned() {
        let mut success = 0;
        let mut failure = 0;
        let mut in_progress = 0;
        for status in StackStatus::ALL {
            match classify(status.as_str()).unwrap() {
                OperationOutcome::Success => success += 1,
                OperationOutcome::Failure => failure += 1,
                OperationOutcome::InProgress => in_progress += 1,
            }
        }
        assert_eq!(success, 4);
        assert_eq!(failure, 9);
        assert_eq!(in_progress, 10);
    }

    #[test]
    fn test_in_progress_codes_end_with_suffix() {
        for status in StackStatus::ALL {
            assert_eq!(
                status.is_in_progress(),
                status.as_str().ends_with("_IN_PROGRESS"),
                "{status}"
            );
        }
    }

    #[test]
    fn test_rollbacks_are_failures() {
        assert_eq!(StackStatus::RollbackComplete.outcome(), OperationOutcome::Failure);
        assert_eq!(
            StackStatus::UpdateRollbackComplete.outcome(),
            OperationOutcome::Failure
        );
        assert_eq!(StackStatus::RollbackFailed.outcome(), OperationOutcome::Failure);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = classify("CREATE_MAYBE").unwrap_err();
        assert_eq!(err.0, "CREATE_MAYBE");
        assert!(classify("create_complete").is_err());
    }

    #[test]
    fn test_status_serialize() {
        let json = serde_json::to_string(&StackStatus::UpdateComplete).unwrap();
        assert_eq!(json, r#""UPDATE_COMPLETE""#);

        let status: StackStatus = serde_json::from_str(r#""DELETE_IN_PROGRESS""#).unwrap();
        assert_eq!(status, StackStatus::DeleteInProgress);
        assert!(!status.is_terminal());
    }
}
