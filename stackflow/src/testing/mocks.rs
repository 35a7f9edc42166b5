//! A scripted provisioning API for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::errors::ProviderError;
use crate::provider::{ProvisioningApi, RemoteStackState, StackRequest};

/// One scripted reply to `describe_stack`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedResponse {
    /// The stack exists with this raw status.
    Status(String),
    /// The stack does not exist.
    Missing,
    /// The provider fails the request.
    Error(ProviderError),
}

/// A call received by [`ScriptedProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    /// `describe_stack`.
    Describe(String),
    /// `create_stack`.
    Create(StackRequest),
    /// `update_stack`.
    Update(StackRequest),
    /// `delete_stack`.
    Delete(String),
}

impl ProviderCall {
    /// Returns the stack name the call targets.
    #[must_use]
    pub fn stack_name(&self) -> &str {
        match self {
            Self::Describe(name) | Self::Delete(name) => name,
            Self::Create(request) | Self::Update(request) => &request.stack_name,
        }
    }

    /// Returns true for create, update, and delete.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Describe(_))
    }
}

/// Provisioning API that replays scripted describe responses.
///
/// Each stack has a queue of responses. Every describe pops the front of
/// the queue, except that the last entry is sticky and repeats forever. A
/// stack with no script is reported missing. Mutations succeed unless a
/// failure was scripted for that stack.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    failures: Mutex<HashMap<(String, &'static str), ProviderError>>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedProvider {
    /// Creates a provider with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response to a stack's describe queue.
    pub fn script(&self, stack: &str, response: ScriptedResponse) {
        self.scripts
            .lock()
            .entry(stack.to_string())
            .or_default()
            .push_back(response);
    }

    /// Appends status responses.
    pub fn script_statuses(&self, stack: &str, statuses: &[&str]) {
        for status in statuses {
            self.script(stack, ScriptedResponse::Status((*status).to_string()));
        }
    }

    /// Appends a "does not exist" response.
    pub fn script_missing(&self, stack: &str) {
        self.script(stack, ScriptedResponse::Missing);
    }

    /// Makes the next describes of `stack` fail with `error`.
    pub fn script_error(&self, stack: &str, error: ProviderError) {
        self.script(stack, ScriptedResponse::Error(error));
    }

    /// Makes `create_stack` fail for `stack`.
    pub fn fail_create(&self, stack: &str, error: ProviderError) {
        self.failures.lock().insert((stack.to_string(), "create"), error);
    }

    /// Makes `update_stack` fail for `stack`.
    pub fn fail_update(&self, stack: &str, error: ProviderError) {
        self.failures.lock().insert((stack.to_string(), "update"), error);
    }

    /// Makes `delete_stack` fail for `stack`.
    pub fn fail_delete(&self, stack: &str, error: ProviderError) {
        self.failures.lock().insert((stack.to_string(), "delete"), error);
    }

    /// Returns every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    /// Returns create, update, and delete calls, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Returns the number of describes of `stack`.
    #[must_use]
    pub fn describe_count(&self, stack: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, ProviderCall::Describe(name) if name == stack))
            .count()
    }

    /// Clears recorded calls; scripts are kept.
    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn next_response(&self, stack: &str) -> ScriptedResponse {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(stack) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ScriptedResponse::Missing),
            Some(queue) => queue.front().cloned().unwrap_or(ScriptedResponse::Missing),
            None => ScriptedResponse::Missing,
        }
    }

    fn mutation_result(&self, stack: &str, kind: &'static str) -> Result<(), ProviderError> {
        match self.failures.lock().get(&(stack.to_string(), kind)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProvisioningApi for ScriptedProvider {
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<RemoteStackState>, ProviderError> {
        self.calls
            .lock()
            .push(ProviderCall::Describe(stack_name.to_string()));
        match self.next_response(stack_name) {
            ScriptedResponse::Status(status) => Ok(Some(RemoteStackState::new(stack_name, status))),
            ScriptedResponse::Missing => Ok(None),
            ScriptedResponse::Error(error) => Err(error),
        }
    }

    async fn create_stack(&self, request: &StackRequest) -> Result<(), ProviderError> {
        self.calls.lock().push(ProviderCall::Create(request.clone()));
        self.mutation_result(&request.stack_name, "create")
    }

    async fn update_stack(&self, request: &StackRequest) -> Result<(), ProviderError> {
        self.calls.lock().push(ProviderCall::Update(request.clone()));
        self.mutation_result(&request.stack_name, "update")
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .push(ProviderCall::Delete(stack_name.to_string()));
        self.mutation_result(stack_name, "delete")
    }
}
