//! The orchestration engine.
//!
//! - [`Poller`]: waits for one stack to settle
//! - [`StackDriver`]: create/update/delete/describe for one stack
//! - [`BatchSequencer`]: sequential, fail-fast iteration over a set
//! - [`Orchestrator`]: hooks and commands over a resolved set

mod driver;
mod orchestrator;
mod poller;
mod sequencer;

pub use driver::{StackDriver, DRY_RUN_REASON};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use poller::{PollOutcome, Poller, PollerConfig, DEFAULT_POLL_INTERVAL};
pub use sequencer::{BatchError, BatchOperation, BatchResult, BatchSequencer};
