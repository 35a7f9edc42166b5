//! Strictly sequential, fail-fast batch processing.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::core::StackOutcome;
use crate::definition::{StackDefinition, StackSet};
use crate::errors::{Result, StackflowError};

/// The operation applied to every stack in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    /// Create or update, in declaration order.
    Deploy,
    /// Delete, in reverse declaration order.
    Remove,
    /// Describe, in declaration order.
    Info,
}

impl BatchOperation {
    /// Returns true if stacks are visited last to first.
    #[must_use]
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Remove)
    }
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => write!(f, "deploy"),
            Self::Remove => write!(f, "remove"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Outcome of a batch that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// The operation applied.
    pub operation: BatchOperation,
    /// Per-stack outcomes, in the order the stacks were visited.
    pub outcomes: Vec<(String, StackOutcome)>,
}

impl BatchResult {
    /// Creates an empty result.
    #[must_use]
    pub fn empty(operation: BatchOperation) -> Self {
        Self {
            operation,
            outcomes: Vec::new(),
        }
    }

    /// Returns true if no stack was visited.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the outcome for `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&StackOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Logical names in visiting order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of stacks that were actually changed.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_change()).count()
    }
}

/// The first failure of a batch.
///
/// Stacks after `stack` were not attempted. Stacks before it keep whatever
/// state they reached; nothing is rolled back.
#[derive(Debug, Error)]
#[error("Additional stack '{stack}' failed during {operation}: {error}")]
pub struct BatchError {
    /// The operation applied.
    pub operation: BatchOperation,
    /// Logical name of the failing stack.
    pub stack: String,
    /// The underlying error.
    pub error: StackflowError,
    /// Outcomes of the stacks that completed before the failure.
    pub completed: Vec<(String, StackOutcome)>,
}

/// Visits a stack set one stack at a time.
///
/// Each stack's operation fully completes, including its wait, before the
/// next starts. The first error stops the batch. Cancellation is checked
/// before every stack.
#[derive(Debug, Clone, Default)]
pub struct BatchSequencer {
    cancel: Arc<CancellationToken>,
}

impl BatchSequencer {
    /// Creates a sequencer observing `cancel`.
    #[must_use]
    pub fn new(cancel: Arc<CancellationToken>) -> Self {
        Self { cancel }
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.cancel
    }

    /// Applies `per_stack` to each stack in `stacks`.
    ///
    /// [`BatchOperation::Remove`] visits stacks in reverse order.
    pub async fn run<F, Fut>(
        &self,
        stacks: &StackSet,
        operation: BatchOperation,
        mut per_stack: F,
    ) -> std::result::Result<BatchResult, BatchError>
    where
        F: FnMut(String, StackDefinition) -> Fut,
        Fut: Future<Output = Result<StackOutcome>>,
    {
        let order: Vec<(&str, &StackDefinition)> = if operation.is_reversed() {
            stacks.iter_rev().collect()
        } else {
            stacks.iter().collect()
        };
        debug!(operation = %operation, count = order.len(), "Starting batch");

        let mut completed = Vec::with_capacity(order.len());
        for (name, definition) in order {
            if self.cancel.is_cancelled() {
                let reason = self
                    .cancel
                    .reason()
                    .unwrap_or_else(|| "cancelled".to_string());
                warn!(stack = %name, "Batch cancelled before stack");
                return Err(BatchError {
                    operation,
                    stack: name.to_string(),
                    error: StackflowError::Cancelled(reason),
                    completed,
                });
            }

            match per_stack(name.to_string(), definition.clone()).await {
                Ok(outcome) => {
                    debug!(stack = %name, outcome = %outcome, "Stack done");
                    completed.push((name.to_string(), outcome));
                }
                Err(error) => {
                    warn!(stack = %name, error = %error, "Batch stopped");
                    return Err(BatchError {
                        operation,
                        stack: name.to_string(),
                        error,
                        completed,
                    });
                }
            }
        }

        Ok(BatchResult {
            operation,
            outcomes: completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StackOperationFailedError;
    use crate::core::OperationKind;
    use crate::testing::stack_set;
    use parking_lot::Mutex;
    use serde_json::json;

    fn three() -> StackSet {
        stack_set(&json!({"a": {}, "b": {}, "c": {}})).unwrap()
    }

    #[tokio::test]
    async fn test_fail_fast_never_attempts_later_stacks() {
        let visited = Arc::new(Mutex::new(Vec::new()));
        let sequencer = BatchSequencer::default();

        let seen = visited.clone();
        let err = sequencer
            .run(&three(), BatchOperation::Deploy, move |name, _| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(name.clone());
                    let result: Result<StackOutcome> = if name == "b" {
                        Err(StackOperationFailedError::new(
                            "svc-dev-b",
                            OperationKind::Create,
                            "ROLLBACK_COMPLETE",
                        )
                        .into())
                    } else {
                        Ok(StackOutcome::Unchanged)
                    };
                    result
                }
            })
            .await
            .unwrap_err();

        assert_eq!(*visited.lock(), vec!["a", "b"]);
        assert_eq!(err.stack, "b");
        assert_eq!(err.completed.len(), 1);
        assert!(err.to_string().contains("ROLLBACK_COMPLETE"));
        assert!(err.to_string().contains("'b'"));
    }

    #[tokio::test]
    async fn test_remove_visits_in_reverse() {
        let result = BatchSequencer::default()
            .run(&three(), BatchOperation::Remove, |_, _| async {
                Ok::<_, StackflowError>(StackOutcome::Deleted)
            })
            .await
            .unwrap();
        assert_eq!(result.names(), vec!["c", "b", "a"]);
        assert_eq!(result.changed(), 3);
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let result = BatchSequencer::default()
            .run(&StackSet::new(), BatchOperation::Deploy, |_, _| async {
                Ok::<_, StackflowError>(StackOutcome::Unchanged)
            })
            .await
            .unwrap();
        assert!(result.is_noop());
    }

    #[tokio::test]
    async fn test_cancelled_before_next_stack() {
        let token = Arc::new(CancellationToken::new());
        let sequencer = BatchSequencer::new(token.clone());

        let err = sequencer
            .run(&three(), BatchOperation::Deploy, move |name, _| {
                let token = token.clone();
                async move {
                    if name == "a" {
                        token.cancel("interrupted");
                    }
                    Ok::<_, StackflowError>(StackOutcome::Unchanged)
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.stack, "b");
        assert!(err.error.is_interrupted());
        assert_eq!(err.completed, vec![("a".to_string(), StackOutcome::Unchanged)]);
    }
}
