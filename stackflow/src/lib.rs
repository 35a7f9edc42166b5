//! # Stackflow
//!
//! Lifecycle orchestration for named infrastructure stacks provisioned
//! through a remote, asynchronous provisioning API.
//!
//! Stackflow decides, for each declared stack, whether to create, update,
//! or leave it alone; submits the request; and then polls the provider
//! until the stack settles, classifying the terminal status as success or
//! failure. It provides:
//!
//! - **Stack set resolution**: ordered, fragment-merged stack definitions
//!   partitioned by deployment timing
//! - **Template compilation**: deterministic request bodies and tag sets
//! - **Operation driving**: create/update/delete with no-op detection
//! - **Polling**: a cancellable, optionally bounded stack-wait state machine
//! - **Batch sequencing**: strictly sequential, fail-fast processing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stackflow::prelude::*;
//!
//! let config = ServiceConfig::from_path("serverless.yml")?;
//! let stacks = resolve(&config.custom.additional_stacks)?;
//!
//! let orchestrator = Orchestrator::builder(provider, stacks)
//!     .context(config.compile_context(None)?)
//!     .settings(EngineSettings::default())
//!     .build();
//!
//! orchestrator.deploy_all().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod events;
pub mod provider;
pub mod template;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{EngineSettings, ServiceConfig};
    pub use crate::core::{
        OperationKind, OperationOutcome, StackEvent, StackInfo, StackOutcome, StackStatus,
    };
    pub use crate::definition::{resolve, DeployTiming, StackDefinition, StackSet};
    pub use crate::engine::{
        BatchError, BatchOperation, BatchResult, BatchSequencer, Orchestrator, PollOutcome,
        Poller, PollerConfig, StackDriver,
    };
    pub use crate::errors::{
        ConfigurationError, ProviderError, StackOperationFailedError, StackflowError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::provider::{ProvisioningApi, RemoteStackState, StackRequest};
    pub use crate::template::{compile_stack, CompileContext, CompiledStack, CompiledTemplate};
}
