//! The stack-wait state machine.
//!
//! After a create, update, or delete is accepted the poller queries the
//! provider until the stack reaches a terminal status:
//!
//! ```text
//! Querying ──in_progress──> (delay) ──> Querying
//!    │
//!    ├──success──> Completed(status)
//!    ├──failure──> StackOperationFailed
//!    └──absent───> NotFound   (delete only)
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cancellation::CancellationToken;
use crate::core::{OperationKind, OperationOutcome, StackEvent, StackStatus};
use crate::errors::{ProviderError, Result, StackOperationFailedError, StackflowError};
use crate::events::EventSink;
use crate::provider::{self, ProvisioningApi};

/// Delay between status queries unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poller configuration.
///
/// Both bounds default to `None`, which waits for as long as the provider
/// keeps reporting progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between status queries.
    pub interval: Duration,
    /// Give up once this much time has passed.
    pub max_wait: Option<Duration>,
    /// Give up after this many delay cycles.
    pub max_attempts: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_attempts: None,
        }
    }
}

impl PollerConfig {
    /// Creates a config with the default interval and no bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between queries.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the maximum total wait.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Sets the maximum number of delay cycles.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Terminal state of a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The stack settled in a success status.
    Completed(StackStatus),
    /// The stack no longer exists; only produced for deletes.
    NotFound,
}

/// Polls a stack until it settles.
#[derive(Clone)]
pub struct Poller {
    api: Arc<dyn ProvisioningApi>,
    events: Arc<dyn EventSink>,
    config: PollerConfig,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller").field("config", &self.config).finish()
    }
}

impl Poller {
    /// Creates a poller.
    #[must_use]
    pub fn new(api: Arc<dyn ProvisioningApi>, events: Arc<dyn EventSink>, config: PollerConfig) -> Self {
        Self { api, events, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Waits for `full_name` to reach a terminal status.
    ///
    /// `name` is the logical name used in progress events. Cancellation is
    /// observed before every query and during every delay.
    pub async fn wait(
        &self,
        name: &str,
        full_name: &str,
        kind: OperationKind,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let started = Instant::now();
        let mut cycles: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(cancel));
            }

            let Some(state) = provider::describe(self.api.as_ref(), full_name).await? else {
                if kind == OperationKind::Delete {
                    debug!(stack = %full_name, "Stack no longer exists");
                    return Ok(PollOutcome::NotFound);
                }
                return Err(ProviderError::new(format!(
                    "Stack {full_name} disappeared while waiting for {kind}"
                ))
                .into());
            };

            let status = state.status().map_err(|e| StackflowError::UnknownStatus {
                stack: full_name.to_string(),
                status: e.0,
            })?;

            match status.outcome() {
                OperationOutcome::Success => {
                    info!(stack = %full_name, status = %status, "Stack {kind} complete");
                    self.events.emit(StackEvent::completed(name, kind, status)).await;
                    return Ok(PollOutcome::Completed(status));
                }
                OperationOutcome::Failure => {
                    warn!(stack = %full_name, status = %status, "Stack {kind} failed");
                    self.events
                        .emit(StackEvent::failed(name, kind, status.as_str()))
                        .await;
                    return Err(
                        StackOperationFailedError::new(full_name, kind, status.as_str()).into(),
                    );
                }
                OperationOutcome::InProgress => {
                    self.check_bounds(full_name, kind, started, cycles)?;
                    cycles += 1;
                    debug!(stack = %full_name, status = %status, cycle = cycles, "Waiting for stack");
                    self.events
                        .emit(StackEvent::polling(name, kind, status, cycles))
                        .await;

                    tokio::select! {
                        () = tokio::time::sleep(self.config.interval) => {}
                        () = cancel.cancelled() => return Err(cancelled(cancel)),
                    }
                }
            }
        }
    }

    fn check_bounds(
        &self,
        full_name: &str,
        kind: OperationKind,
        started: Instant,
        cycles: u32,
    ) -> Result<()> {
        let waited = started.elapsed();
        let attempts_exhausted = self.config.max_attempts.is_some_and(|max| cycles >= max);
        let time_exhausted = self.config.max_wait.is_some_and(|max| waited >= max);
        if attempts_exhausted || time_exhausted {
            warn!(stack = %full_name, waited_secs = waited.as_secs(), "Gave up waiting for stack");
            return Err(StackflowError::Timeout {
                stack: full_name.to_string(),
                kind,
                waited,
            });
        }
        Ok(())
    }
}

fn cancelled(cancel: &CancellationToken) -> StackflowError {
    StackflowError::Cancelled(cancel.reason().unwrap_or_else(|| "cancelled".to_string()))
}
