// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, info};

use crate::engine::sequencer::BatchSequencer;
use crate::engine::{RunId, RuntimeOptions};
use crate::errors::Result;
use crate::history::{FetchRequest, FetchedBatch, HistoryFilter};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Start these fetches; results must be tagged with `run`.
    FetchBatches {
        run: RunId,
        requests: Vec<FetchRequest>,
    },
    /// A batch of the current run can never be delivered.
    FailRun {
        run: RunId,
        batch_index: usize,
        message: String,
    },
    /// Request that the runtime stops (every batch delivered, once mode).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

/// Fetch plan of the current run.
///
/// At most `max_ahead` batches past the next undelivered one are ever in
/// flight, so every fetched batch fits the sequencer's pending window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub batch_size: usize,
    pub max_ahead: usize,
    pub filter: HistoryFilter,
    /// Number of batches in the run, known once batch 0 arrived.
    pub total_batches: Option<usize>,
    /// Lowest batch index not requested yet.
    pub next_request: usize,
}

impl FetchPlan {
    pub fn new(batch_size: usize, max_ahead: usize, filter: HistoryFilter) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_ahead: max_ahead.max(1),
            filter,
            total_batches: None,
            next_request: 0,
        }
    }

    /// Whether every planned batch has been delivered.
    pub fn is_complete(&self, delivered: usize) -> bool {
        self.total_batches.is_some_and(|total| delivered >= total)
    }

    /// Requests that keep the window past `expected_index` full.
    pub fn top_up(&mut self, expected_index: usize) -> Vec<FetchRequest> {
        let Some(total) = self.total_batches else {
            return Vec::new();
        };

        let limit = total.min(expected_index + self.max_ahead);
        if self.next_request >= limit {
            return Vec::new();
        }

        let requests = (self.next_request..limit)
            .map(|idx| self.request(idx))
            .collect();
        self.next_request = limit;
        requests
    }

    fn request(&self, batch_index: usize) -> FetchRequest {
        FetchRequest::page(batch_index, self.batch_size, self.filter.clone())
    }
}

/// Kick off a run: only the first page is requested, since the total commit
/// count is not known yet.
pub fn start_run(plan: &mut FetchPlan, run: RunId) -> CoreStep {
    plan.total_batches = None;
    plan.next_request = 1;
    info!(run, batch_size = plan.batch_size, "requesting first history batch");

    CoreStep {
        commands: vec![CoreCommand::FetchBatches {
            run,
            requests: vec![plan.request(0)],
        }],
        keep_running: true,
    }
}

/// Handle a fetched batch.
///
/// - Results for a superseded or failed run are dropped.
/// - The first arrival of batch 0 fixes the run's size.
/// - The batch is then handed to the sequencer, which delivers whatever has
///   become contiguous, and the fetch window is topped up.
pub fn handle_batch_fetched<M: Send + 'static>(
    sequencer: &mut BatchSequencer<M>,
    plan: &mut FetchPlan,
    options: &RuntimeOptions,
    run: RunId,
    batch: FetchedBatch<M>,
) -> Result<CoreStep> {
    if run != sequencer.current_run() {
        debug!(
            run,
            current_run = sequencer.current_run(),
            batch = batch.batch_index,
            "dropping fetch result from superseded run"
        );
        return Ok(CoreStep::idle());
    }

    if sequencer.run_failed() {
        debug!(run, batch = batch.batch_index, "dropping fetch result for failed run");
        return Ok(CoreStep::idle());
    }

    if batch.batch_index == 0 && plan.total_batches.is_none() {
        let total_batches = batch.total_count.div_ceil(plan.batch_size).max(1);
        plan.total_batches = Some(total_batches);
        info!(
            run,
            total_count = batch.total_count,
            total_batches,
            "history size known; requesting remaining batches"
        );
    }

    let was_complete = plan.is_complete(sequencer.delivered_count());
    sequencer.submit_batch(run, batch.batch_index, batch.commits, batch.total_count)?;
    let complete = plan.is_complete(sequencer.delivered_count());

    let mut commands = Vec::new();
    let requests = plan.top_up(sequencer.expected_index());
    if !requests.is_empty() {
        commands.push(CoreCommand::FetchBatches { run, requests });
    }

    if complete && !was_complete {
        info!(
            run,
            batches = sequencer.delivered_count(),
            "all batches delivered"
        );
    }

    let mut keep_running = true;
    if options.exit_when_complete && complete {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    Ok(CoreStep {
        commands,
        keep_running,
    })
}

/// Handle a failed fetch. The sequencer never sees the batch, so delivery
/// stops at the gap and the run is marked failed.
pub fn handle_fetch_failed<M: Send + 'static>(
    sequencer: &mut BatchSequencer<M>,
    options: &RuntimeOptions,
    run: RunId,
    batch_index: usize,
    message: String,
) -> CoreStep {
    if run != sequencer.current_run() {
        debug!(run, batch = batch_index, "ignoring fetch failure from superseded run");
        return CoreStep::idle();
    }

    if sequencer.run_failed() {
        debug!(run, batch = batch_index, %message, "run already failed; ignoring fetch failure");
        return CoreStep::idle();
    }

    error!(run, batch = batch_index, %message, "history fetch failed");
    sequencer.fail_run();

    CoreStep {
        commands: vec![CoreCommand::FailRun {
            run,
            batch_index,
            message,
        }],
        keep_running: !options.exit_when_complete,
    }
}

/// Handle a restart request: reset the sequencer and plan a fresh run.
pub fn handle_restart<M: Send + 'static>(
    sequencer: &mut BatchSequencer<M>,
    plan: &mut FetchPlan,
) -> CoreStep {
    let run = sequencer.restart();
    start_run(plan, run)
}
