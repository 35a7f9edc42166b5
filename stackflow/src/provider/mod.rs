//! The provisioning API boundary.
//!
//! The engine talks to the remote provider only through
//! [`ProvisioningApi`]. A handle is passed into the driver and poller at
//! construction; there is no process-wide client.

#[cfg(feature = "http")]
mod http;
pub mod signatures;

#[cfg(feature = "http")]
pub use http::HttpProvisioningClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{StackStatus, UnknownStatusCode};
use crate::definition::DeployParameter;
use crate::errors::ProviderError;
use crate::template::Tag;

/// Capabilities acknowledged on create/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Template may create IAM resources.
    #[serde(rename = "CAPABILITY_IAM")]
    Iam,
    /// Template may create named IAM resources.
    #[serde(rename = "CAPABILITY_NAMED_IAM")]
    NamedIam,
    /// Template contains macros that expand on the provider side.
    #[serde(rename = "CAPABILITY_AUTO_EXPAND")]
    AutoExpand,
}

impl Capability {
    /// Capabilities for a template; auto-expand only when it has a transform.
    #[must_use]
    pub fn for_template(has_transform: bool) -> Vec<Self> {
        let mut capabilities = vec![Self::Iam, Self::NamedIam];
        if has_transform {
            capabilities.push(Self::AutoExpand);
        }
        capabilities
    }

    /// Returns the provider's wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iam => "CAPABILITY_IAM",
            Self::NamedIam => "CAPABILITY_NAMED_IAM",
            Self::AutoExpand => "CAPABILITY_AUTO_EXPAND",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the provider does when a create fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnFailure {
    /// Roll the stack back.
    #[default]
    Rollback,
}

/// A create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackRequest {
    /// Full remote stack name.
    pub stack_name: String,
    /// Serialized template.
    pub template_body: String,
    /// Stack tags.
    pub tags: Vec<Tag>,
    /// Acknowledged capabilities.
    pub capabilities: Vec<Capability>,
    /// Parameters, passed through verbatim.
    pub parameters: Vec<DeployParameter>,
    /// Failure policy; only meaningful on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<OnFailure>,
}

/// The provider's view of an existing stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteStackState {
    /// Full remote stack name.
    pub stack_name: String,
    /// Raw status code.
    pub stack_status: String,
    /// Tags currently on the stack.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl RemoteStackState {
    /// Creates a state with no tags.
    #[must_use]
    pub fn new(stack_name: impl Into<String>, stack_status: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            stack_status: stack_status.into(),
            tags: Vec::new(),
        }
    }

    /// Parses the status code.
    pub fn status(&self) -> Result<StackStatus, UnknownStatusCode> {
        self.stack_status.parse()
    }
}

/// Remote provisioning operations.
///
/// `describe_stack` returns `Ok(None)` for a stack that does not exist.
/// Adapters that cannot tell may return the provider's error instead; the
/// engine always calls through [`describe`], which folds that error into
/// `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// Fetches the current state of a stack.
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<RemoteStackState>, ProviderError>;

    /// Submits a create request.
    async fn create_stack(&self, request: &StackRequest) -> Result<(), ProviderError>;

    /// Submits an update request.
    async fn update_stack(&self, request: &StackRequest) -> Result<(), ProviderError>;

    /// Submits a delete request.
    async fn delete_stack(&self, stack_name: &str) -> Result<(), ProviderError>;
}

/// Describes a stack, mapping the "does not exist" signature to `None`.
pub async fn describe(
    api: &dyn ProvisioningApi,
    stack_name: &str,
) -> Result<Option<RemoteStackState>, ProviderError> {
    match api.describe_stack(stack_name).await {
        Ok(state) => Ok(state),
        Err(err) if signatures::is_stack_missing(&err) => Ok(None),
        Err(err) => Err(err),
    }
}
