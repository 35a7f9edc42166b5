//! Cooperative cancellation for in-flight orchestration.
//!
//! A single [`CancellationToken`] is shared by the sequencer and the poller.
//! The sequencer checks it between stacks; the poller races it against the
//! delay between status queries, so an abort lands within one interval.

mod token;

pub use token::CancellationToken;
