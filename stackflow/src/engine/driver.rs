//! Per-stack create, update, delete, and describe.

use std::sync::Arc;
use tracing::{debug, info};

use super::poller::{PollOutcome, Poller, PollerConfig};
use crate::cancellation::CancellationToken;
use crate::core::{OperationKind, StackEvent, StackInfo, StackOutcome, StackStatus};
use crate::errors::{ProviderError, Result};
use crate::events::EventSink;
use crate::provider::{self, signatures, Capability, OnFailure, ProvisioningApi, StackRequest};
use crate::template::{CompiledStack, TemplateWriter};

/// Reason recorded on outcomes produced under dry-run.
pub const DRY_RUN_REASON: &str = "dry run";

/// Drives one stack at a time against the provider.
///
/// The driver decides between create and update by describing the stack
/// first, submits the request, and hands the wait to its [`Poller`].
pub struct StackDriver {
    api: Arc<dyn ProvisioningApi>,
    events: Arc<dyn EventSink>,
    poller: Poller,
    writer: Option<TemplateWriter>,
    dry_run: bool,
}

impl std::fmt::Debug for StackDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackDriver")
            .field("poller", &self.poller)
            .field("writer", &self.writer)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl StackDriver {
    /// Creates a driver.
    #[must_use]
    pub fn new(
        api: Arc<dyn ProvisioningApi>,
        events: Arc<dyn EventSink>,
        poller_config: PollerConfig,
    ) -> Self {
        let poller = Poller::new(api.clone(), events.clone(), poller_config);
        Self {
            api,
            events,
            poller,
            writer: None,
            dry_run: false,
        }
    }

    /// Writes each compiled template to disk before deploying it.
    #[must_use]
    pub fn with_template_writer(mut self, writer: TemplateWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Stops after template compilation; no remote mutation is made.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns true if the driver is in dry-run mode.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Creates the stack if it does not exist, otherwise updates it.
    pub async fn deploy(&self, stack: &CompiledStack, cancel: &CancellationToken) -> Result<StackOutcome> {
        if let Some(ref writer) = self.writer {
            let path = writer.write(&stack.name, &stack.template).await?;
            self.events
                .emit(StackEvent::template_written(&stack.name, &path))
                .await;
        }

        if self.dry_run {
            info!(stack = %stack.full_name, "Dry run, not deploying");
            self.events
                .emit(StackEvent::skipped(&stack.name, DRY_RUN_REASON))
                .await;
            return Ok(StackOutcome::Skipped {
                reason: DRY_RUN_REASON.to_string(),
            });
        }

        let existing = provider::describe(self.api.as_ref(), &stack.full_name).await?;
        let kind = if existing.is_some() {
            OperationKind::Update
        } else {
            OperationKind::Create
        };
        let request = build_request(stack, kind)?;

        self.events
            .emit(StackEvent::started(&stack.name, kind, &stack.full_name))
            .await;

        let submitted = match kind {
            OperationKind::Create => self.api.create_stack(&request).await,
            _ => self.api.update_stack(&request).await,
        };

        if let Err(err) = submitted {
            if kind == OperationKind::Update && signatures::is_no_updates(&err) {
                info!(stack = %stack.full_name, "Stack has not changed");
                self.events.emit(StackEvent::unchanged(&stack.name)).await;
                return Ok(StackOutcome::Unchanged);
            }
            return Err(self.fail(&stack.name, kind, err).await);
        }

        debug!(stack = %stack.full_name, operation = %kind, "Request accepted, waiting");
        let status = match self
            .poller
            .wait(&stack.name, &stack.full_name, kind, cancel)
            .await?
        {
            PollOutcome::Completed(status) => status,
            PollOutcome::NotFound => {
                return Err(ProviderError::new(format!(
                    "Stack {} vanished during {kind}",
                    stack.full_name
                ))
                .into());
            }
        };

        Ok(match kind {
            OperationKind::Create => StackOutcome::Created { status },
            _ => StackOutcome::Updated { status },
        })
    }

    /// Deletes the stack if it exists.
    pub async fn remove(
        &self,
        name: &str,
        full_name: &str,
        cancel: &CancellationToken,
    ) -> Result<StackOutcome> {
        if self.dry_run {
            info!(stack = %full_name, "Dry run, not removing");
            self.events.emit(StackEvent::skipped(name, DRY_RUN_REASON)).await;
            return Ok(StackOutcome::Skipped {
                reason: DRY_RUN_REASON.to_string(),
            });
        }

        if provider::describe(self.api.as_ref(), full_name).await?.is_none() {
            info!(stack = %full_name, "Stack does not exist, nothing to remove");
            self.events
                .emit(StackEvent::skipped(name, "does not exist"))
                .await;
            return Ok(StackOutcome::Absent);
        }

        self.events
            .emit(StackEvent::started(name, OperationKind::Delete, full_name))
            .await;

        if let Err(err) = self.api.delete_stack(full_name).await {
            return Err(self.fail(name, OperationKind::Delete, err).await);
        }

        match self
            .poller
            .wait(name, full_name, OperationKind::Delete, cancel)
            .await?
        {
            PollOutcome::Completed(status) => {
                debug!(stack = %full_name, status = %status, "Delete settled");
            }
            PollOutcome::NotFound => {
                self.events
                    .emit(StackEvent::completed(
                        name,
                        OperationKind::Delete,
                        StackStatus::DeleteComplete,
                    ))
                    .await;
            }
        }
        Ok(StackOutcome::Deleted)
    }

    /// Reads the current status of a stack without changing it.
    pub async fn info(&self, name: &str, full_name: &str) -> Result<StackInfo> {
        let state = provider::describe(self.api.as_ref(), full_name).await?;
        Ok(StackInfo {
            name: name.to_string(),
            full_name: full_name.to_string(),
            status: state.map(|s| s.stack_status),
        })
    }

    async fn fail(&self, name: &str, kind: OperationKind, err: ProviderError) -> crate::errors::StackflowError {
        self.events
            .emit(StackEvent::failed(name, kind, &err.message))
            .await;
        err.into()
    }
}

fn build_request(stack: &CompiledStack, kind: OperationKind) -> Result<StackRequest> {
    Ok(StackRequest {
        stack_name: stack.full_name.clone(),
        template_body: stack.template.to_body()?,
        tags: stack.tags.to_vec(),
        capabilities: Capability::for_template(stack.template.has_transform()),
        parameters: stack.parameters.clone(),
        on_failure: (kind == OperationKind::Create).then_some(OnFailure::Rollback),
    })
}
