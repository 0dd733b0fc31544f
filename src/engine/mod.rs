// src/engine/mod.rs

//! Run orchestration for lanegraph.
//!
//! This module ties together:
//! - the batch sequencer, which owns the lane engine for the current run and
//!   reorders batches that complete out of order
//! - fetch planning (first batch, then every remaining page once the total
//!   commit count is known)
//! - the runtime event loop that reacts to:
//!   - fetched batches
//!   - fetch failures
//!   - restart requests (the history changed; start a new run)
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::history::{CommitInfo, FetchedBatch};

/// Identifier of one run (one continuous commit stream with its own lane
/// state). Bumped every time a consumer is registered or the run restarts.
pub type RunId = u64;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, stop the runtime once every batch of the run has been
    /// delivered, and treat fetch failures as fatal.
    pub exit_when_complete: bool,
}

/// Events flowing into the runtime from fetch tasks, watchers, etc.
#[derive(Debug)]
pub enum RuntimeEvent<M = CommitInfo> {
    /// A fetch task finished successfully.
    BatchFetched { run: RunId, batch: FetchedBatch<M> },
    /// A fetch task failed; the batch will never arrive for this run.
    FetchFailed {
        run: RunId,
        batch_index: usize,
        message: String,
    },
    /// The underlying history changed; start over with a new run.
    RestartRequested,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

impl<M> RuntimeEvent<M> {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeEvent::BatchFetched { .. } => "batch_fetched",
            RuntimeEvent::FetchFailed { .. } => "fetch_failed",
            RuntimeEvent::RestartRequested => "restart_requested",
            RuntimeEvent::ShutdownRequested => "shutdown_requested",
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod sequencer;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use sequencer::{
    BatchConsumer, BatchSequencer, DeliveredBatch, GraphedCommit, SequencerOptions, SubmitOutcome,
};
