// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state (sequencer, lane engine, fetch plan)
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - spawning fetch tasks
//! - handling Ctrl+C / shutdown
//!
//! The core is unit-testable without any Tokio, channels, or filesystem.

use tracing::error;

use crate::engine::event_handlers::{
    CoreStep, FetchPlan, handle_batch_fetched, handle_fetch_failed, handle_restart, start_run,
};
use crate::engine::sequencer::{BatchConsumer, BatchSequencer};
use crate::engine::{RunId, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::history::HistoryFilter;

/// Pure core runtime state.
///
/// This owns:
/// - the batch sequencer (and through it the lane engine)
/// - the fetch plan of the current run
/// - runtime options (e.g. `exit_when_complete`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime<M> {
    sequencer: BatchSequencer<M>,
    plan: FetchPlan,
    options: RuntimeOptions,
}

impl<M: Send + 'static> CoreRuntime<M> {
    pub fn new(
        sequencer: BatchSequencer<M>,
        batch_size: usize,
        filter: HistoryFilter,
        options: RuntimeOptions,
    ) -> Self {
        let max_ahead = sequencer.max_pending_batches();
        Self {
            sequencer,
            plan: FetchPlan::new(batch_size, max_ahead, filter),
            options,
        }
    }

    /// Replace the consumer; this starts a new run.
    pub fn register_consumer(&mut self, consumer: impl BatchConsumer<M> + 'static) -> RunId {
        self.plan.total_batches = None;
        self.plan.next_request = 0;
        self.sequencer.register_consumer(consumer)
    }

    /// Commands that start fetching the current run.
    pub fn start_run(&mut self) -> CoreStep {
        start_run(&mut self.plan, self.sequencer.current_run())
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn sequencer(&self) -> &BatchSequencer<M> {
        &self.sequencer
    }

    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }

    /// Whether every batch of the current run has been delivered.
    pub fn is_complete(&self) -> bool {
        self.plan.is_complete(self.sequencer.delivered_count())
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    ///
    /// Errors are caller-contract violations or malformed input for the
    /// current run. With `exit_when_complete` they are returned; otherwise
    /// the run is marked failed and the core waits for a restart.
    pub fn step(&mut self, event: RuntimeEvent<M>) -> Result<CoreStep> {
        match event {
            RuntimeEvent::BatchFetched { run, batch } => {
                let batch_index = batch.batch_index;
                match handle_batch_fetched(
                    &mut self.sequencer,
                    &mut self.plan,
                    &self.options,
                    run,
                    batch,
                ) {
                    Err(err) if !self.options.exit_when_complete => {
                        error!(
                            run,
                            batch = batch_index,
                            error = %err,
                            "run failed; waiting for a restart"
                        );
                        self.sequencer.fail_run();
                        Ok(CoreStep::idle())
                    }
                    result => result,
                }
            }
            RuntimeEvent::FetchFailed {
                run,
                batch_index,
                message,
            } => Ok(handle_fetch_failed(
                &mut self.sequencer,
                &self.options,
                run,
                batch_index,
                message,
            )),
            RuntimeEvent::RestartRequested => {
                Ok(handle_restart(&mut self.sequencer, &mut self.plan))
            }
            RuntimeEvent::ShutdownRequested => Ok(CoreStep {
                commands: Vec::new(),
                keep_running: false,
            }),
        }
    }
}
