//! The command surface over a resolved stack set.
//!
//! Lifecycle hooks ([`Orchestrator::before_deploy`],
//! [`Orchestrator::after_deploy`]) run the timed subsets around the primary
//! deployment. Commands act on every stack or one named stack.

use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::driver::StackDriver;
use super::sequencer::{BatchOperation, BatchResult, BatchSequencer};
use crate::cancellation::CancellationToken;
use crate::config::EngineSettings;
use crate::core::{StackEvent, StackInfo, StackOutcome};
use crate::definition::StackSet;
use crate::errors::{Result, StackflowError};
use crate::events::{EventSink, LoggingEventSink};
use crate::provider::ProvisioningApi;
use crate::template::{compile_stack, full_stack_name, CompileContext, TemplateWriter};
use crate::utils::generate_run_id;

/// Runs hooks and commands over a stack set.
#[derive(Debug)]
pub struct Orchestrator {
    stacks: StackSet,
    context: CompileContext,
    driver: StackDriver,
    sequencer: BatchSequencer,
    skip: bool,
    run_id: Uuid,
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    api: Arc<dyn ProvisioningApi>,
    stacks: StackSet,
    context: CompileContext,
    settings: EngineSettings,
    events: Arc<dyn EventSink>,
    cancel: Arc<CancellationToken>,
}

impl OrchestratorBuilder {
    /// Sets the compile context.
    #[must_use]
    pub fn context(mut self, context: CompileContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the engine settings.
    #[must_use]
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the event sink. Defaults to [`LoggingEventSink`].
    #[must_use]
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancellation(mut self, cancel: Arc<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builds the orchestrator.
    #[must_use]
    pub fn build(self) -> Orchestrator {
        let run_id = generate_run_id();
        let events = self.events.clone();
        self.cancel
            .on_cancel(move || events.try_emit(StackEvent::cancelled(run_id)));

        let mut driver = StackDriver::new(self.api, self.events, self.settings.poller_config())
            .with_dry_run(self.settings.dry_run);
        if let Some(dir) = self.settings.template_dir {
            driver = driver.with_template_writer(TemplateWriter::new(dir));
        }

        Orchestrator {
            stacks: self.stacks,
            context: self.context,
            driver,
            sequencer: BatchSequencer::new(self.cancel),
            skip: self.settings.skip,
            run_id,
        }
    }
}

impl Orchestrator {
    /// Starts building an orchestrator for `stacks`.
    #[must_use]
    pub fn builder(api: Arc<dyn ProvisioningApi>, stacks: StackSet) -> OrchestratorBuilder {
        OrchestratorBuilder {
            api,
            stacks,
            context: CompileContext::default(),
            settings: EngineSettings::default(),
            events: Arc::new(LoggingEventSink::default()),
            cancel: Arc::new(CancellationToken::new()),
        }
    }

    /// Returns the stack set.
    #[must_use]
    pub fn stacks(&self) -> &StackSet {
        &self.stacks
    }

    /// Returns the identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the cancellation token shared by every command.
    #[must_use]
    pub fn cancellation(&self) -> &Arc<CancellationToken> {
        self.sequencer.token()
    }

    /// Deploys the stacks that go before the primary stack.
    pub async fn before_deploy(&self) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Deploy) {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        let stacks = self.stacks.before();
        if stacks.is_empty() {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        info!(run_id = %self.run_id, count = stacks.len(), "Deploying additional stacks...");
        self.deploy_set(&stacks).await
    }

    /// Deploys the stacks that go after the primary stack.
    pub async fn after_deploy(&self) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Deploy) {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        let stacks = self.stacks.after();
        if stacks.is_empty() {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        info!(run_id = %self.run_id, count = stacks.len(), "Deploying additional stacks...");
        self.deploy_set(&stacks).await
    }

    /// Deploys every stack regardless of timing.
    pub async fn deploy_all(&self) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Deploy) {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        if self.stacks.is_empty() {
            info!("No additional stacks defined. Add a custom.additionalStacks section to define some.");
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        info!(run_id = %self.run_id, count = self.stacks.len(), "Deploying all additional stacks...");
        self.deploy_set(&self.stacks).await
    }

    /// Deploys one named stack.
    pub async fn deploy_one(&self, name: &str) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Deploy) {
            return Ok(BatchResult::empty(BatchOperation::Deploy));
        }
        let stacks = self.only(name)?;
        info!(run_id = %self.run_id, stack = %name, "Deploying additional stack {name}...");
        self.deploy_set(&stacks).await
    }

    /// Removes every stack, last declared first.
    pub async fn remove_all(&self) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Remove) {
            return Ok(BatchResult::empty(BatchOperation::Remove));
        }
        if self.stacks.is_empty() {
            info!("No additional stacks defined.");
            return Ok(BatchResult::empty(BatchOperation::Remove));
        }
        info!(run_id = %self.run_id, count = self.stacks.len(), "Removing all additional stacks...");
        self.remove_set(&self.stacks).await
    }

    /// Removes one named stack.
    pub async fn remove_one(&self, name: &str) -> Result<BatchResult> {
        if self.skipped(BatchOperation::Remove) {
            return Ok(BatchResult::empty(BatchOperation::Remove));
        }
        let stacks = self.only(name)?;
        info!(run_id = %self.run_id, stack = %name, "Removing additional stack {name}...");
        self.remove_set(&stacks).await
    }

    /// Reports the status of every stack.
    pub async fn info_all(&self) -> Result<Vec<StackInfo>> {
        if self.skipped(BatchOperation::Info) {
            return Ok(Vec::new());
        }
        let result = self
            .sequencer
            .run(&self.stacks, BatchOperation::Info, |name, definition| async move {
                let full_name = full_stack_name(&self.context.prefix, &name, &definition);
                self.driver
                    .info(&name, &full_name)
                    .await
                    .map(StackOutcome::Described)
            })
            .await?;

        Ok(result
            .outcomes
            .into_iter()
            .filter_map(|(_, outcome)| match outcome {
                StackOutcome::Described(info) => Some(info),
                _ => None,
            })
            .collect())
    }

    async fn deploy_set(&self, stacks: &StackSet) -> Result<BatchResult> {
        let cancel = self.cancellation().clone();
        let result = self
            .sequencer
            .run(stacks, BatchOperation::Deploy, |name, definition| {
                let cancel = cancel.clone();
                let span = info_span!("stack", name = %name, operation = "deploy");
                async move {
                    let compiled = compile_stack(&name, &definition, &self.context);
                    self.driver.deploy(&compiled, &cancel).await
                }
                .instrument(span)
            })
            .await?;
        Ok(result)
    }

    async fn remove_set(&self, stacks: &StackSet) -> Result<BatchResult> {
        let cancel = self.cancellation().clone();
        let result = self
            .sequencer
            .run(stacks, BatchOperation::Remove, |name, definition| {
                let cancel = cancel.clone();
                let span = info_span!("stack", name = %name, operation = "remove");
                async move {
                    let full_name = full_stack_name(&self.context.prefix, &name, &definition);
                    self.driver.remove(&name, &full_name, &cancel).await
                }
                .instrument(span)
            })
            .await?;
        Ok(result)
    }

    fn only(&self, name: &str) -> Result<StackSet> {
        self.stacks
            .only(name)
            .ok_or_else(|| StackflowError::stack_not_found(name))
    }

    fn skipped(&self, operation: BatchOperation) -> bool {
        if self.skip {
            info!(operation = %operation, "Skipping additional stacks");
        }
        self.skip
    }
}
