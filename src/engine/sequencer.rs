// src/engine/sequencer.rs

//! Reordering of out-of-order batches into the lane engine.
//!
//! Batches are fetched concurrently and may complete in any order, but the
//! lane engine must see commits in history order. The sequencer buffers
//! early arrivals by batch index and drains them strictly in ascending,
//! gap-free order, handing each graph-augmented batch to the registered
//! consumer.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::engine::RunId;
use crate::errors::{LaneGraphError, Result};
use crate::graph::color::{LaneColor, default_palette};
use crate::graph::{GraphSlice, LaneEngine};
use crate::history::Commit;
use crate::types::DuplicateBatchBehaviour;

/// A commit together with the graph row computed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphedCommit<M> {
    #[serde(flatten)]
    pub commit: Commit<M>,
    pub graph_slice: GraphSlice,
}

/// What the consumer receives for every delivered batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredBatch<M> {
    pub total_count: usize,
    pub batch_index: usize,
    /// Same order as the submitted batch.
    pub commits: Vec<GraphedCommit<M>>,
}

/// Delivery target for completed batches.
///
/// Consumers only receive owned data, so they cannot call back into the
/// sequencer while a batch is being delivered.
pub trait BatchConsumer<M>: Send {
    fn deliver(&mut self, batch: DeliveredBatch<M>);
}

impl<M, F> BatchConsumer<M> for F
where
    F: FnMut(DeliveredBatch<M>) + Send,
{
    fn deliver(&mut self, batch: DeliveredBatch<M>) {
        self(batch)
    }
}

/// Result of a successful [`BatchSequencer::submit_batch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The batch was accepted; `delivered` batches were handed to the
    /// consumer as a result (0 if it is waiting for an earlier batch).
    Buffered { delivered: usize },
    /// Duplicate batch dropped under [`DuplicateBatchBehaviour::Ignore`].
    Ignored,
    /// The batch belongs to a superseded run and was dropped.
    StaleRun,
}

/// Tunables for a [`BatchSequencer`].
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    /// How far ahead of the next expected index a batch may be buffered.
    pub max_pending_batches: usize,
    pub duplicate_behaviour: DuplicateBatchBehaviour,
    pub palette: Vec<LaneColor>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            max_pending_batches: 64,
            duplicate_behaviour: DuplicateBatchBehaviour::default(),
            palette: default_palette(),
        }
    }
}

#[derive(Debug)]
struct PendingBatch<M> {
    commits: Vec<Commit<M>>,
    total_count: usize,
}

/// Owns the lane engine and the pending buffer for one run at a time.
pub struct BatchSequencer<M> {
    engine: LaneEngine,
    pending: BTreeMap<usize, PendingBatch<M>>,
    /// Next batch index due for delivery. Only ever grows by one.
    expected_index: usize,
    consumer: Option<Box<dyn BatchConsumer<M>>>,
    run_id: RunId,
    run_failed: bool,
    options: SequencerOptions,
}

impl<M> fmt::Debug for BatchSequencer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSequencer")
            .field("run_id", &self.run_id)
            .field("expected_index", &self.expected_index)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("run_failed", &self.run_failed)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<M: Send + 'static> BatchSequencer<M> {
    pub fn new(options: SequencerOptions) -> Self {
        let max_pending_batches = options.max_pending_batches.max(1);
        Self {
            engine: LaneEngine::with_palette(options.palette.clone()),
            pending: BTreeMap::new(),
            expected_index: 0,
            consumer: None,
            run_id: 0,
            run_failed: false,
            options: SequencerOptions {
                max_pending_batches,
                ..options
            },
        }
    }

    /// Replace the delivery target and start a fresh run.
    pub fn register_consumer(&mut self, consumer: impl BatchConsumer<M> + 'static) -> RunId {
        self.consumer = Some(Box::new(consumer));
        self.start_new_run()
    }

    /// Start a fresh run, keeping the current consumer.
    pub fn restart(&mut self) -> RunId {
        self.start_new_run()
    }

    pub fn current_run(&self) -> RunId {
        self.run_id
    }

    /// Index of the next batch due for delivery; equals the number of
    /// batches delivered in this run.
    pub fn expected_index(&self) -> usize {
        self.expected_index
    }

    pub fn delivered_count(&self) -> usize {
        self.expected_index
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn run_failed(&self) -> bool {
        self.run_failed
    }

    /// Give up on the current run: later submissions for it return
    /// [`LaneGraphError::RunFailed`] until a new run starts.
    pub fn fail_run(&mut self) {
        if !self.run_failed {
            warn!(run = self.run_id, pending = self.pending.len(), "run marked failed");
        }
        self.run_failed = true;
        self.pending.clear();
    }

    /// Width of the pending window past the next expected index.
    pub fn max_pending_batches(&self) -> usize {
        self.options.max_pending_batches
    }

    pub fn engine(&self) -> &LaneEngine {
        &self.engine
    }

    /// Accept a batch that may arrive in any order, then deliver every batch
    /// that has become contiguous with what was already delivered.
    pub fn submit_batch(
        &mut self,
        run: RunId,
        batch_index: usize,
        commits: Vec<Commit<M>>,
        total_count: usize,
    ) -> Result<SubmitOutcome> {
        if run != self.run_id {
            debug!(
                run,
                current_run = self.run_id,
                batch = batch_index,
                "dropping batch from superseded run"
            );
            return Ok(SubmitOutcome::StaleRun);
        }

        if self.run_failed {
            return Err(LaneGraphError::RunFailed(run));
        }

        if self.consumer.is_none() {
            return Err(LaneGraphError::NoConsumer(run));
        }

        if batch_index < self.expected_index || self.pending.contains_key(&batch_index) {
            return self.duplicate(batch_index);
        }

        let limit = self.expected_index + self.options.max_pending_batches;
        if batch_index >= limit {
            warn!(
                run,
                batch = batch_index,
                expected = self.expected_index,
                limit,
                "batch outside pending window"
            );
            return Err(LaneGraphError::BatchOutOfWindow {
                index: batch_index,
                expected: self.expected_index,
                limit,
            });
        }

        if let Some(err) = commits.iter().find_map(|c| c.validate().err()) {
            warn!(run, batch = batch_index, error = %err, "rejecting malformed batch");
            return Err(err);
        }

        debug!(
            run,
            batch = batch_index,
            commits = commits.len(),
            expected = self.expected_index,
            "buffered batch"
        );
        self.pending.insert(
            batch_index,
            PendingBatch {
                commits,
                total_count,
            },
        );

        let delivered = self.drain()?;
        Ok(SubmitOutcome::Buffered { delivered })
    }

    fn duplicate(&self, batch_index: usize) -> Result<SubmitOutcome> {
        match self.options.duplicate_behaviour {
            DuplicateBatchBehaviour::Reject => Err(LaneGraphError::DuplicateBatch {
                index: batch_index,
                expected: self.expected_index,
            }),
            DuplicateBatchBehaviour::Ignore => {
                warn!(
                    run = self.run_id,
                    batch = batch_index,
                    expected = self.expected_index,
                    "ignoring duplicate batch"
                );
                Ok(SubmitOutcome::Ignored)
            }
        }
    }

    fn drain(&mut self) -> Result<usize> {
        let mut delivered = 0;

        while let Some(batch) = self.pending.remove(&self.expected_index) {
            let batch_index = self.expected_index;
            let mut commits = Vec::with_capacity(batch.commits.len());

            for commit in batch.commits {
                let graph_slice = match self.engine.process_commit(&commit) {
                    Ok(slice) => slice,
                    Err(err) => {
                        error!(
                            run = self.run_id,
                            batch = batch_index,
                            commit = %commit.hash,
                            error = %err,
                            "lane engine rejected commit; run is unreliable from here"
                        );
                        self.fail_run();
                        return Err(err);
                    }
                };
                commits.push(GraphedCommit {
                    commit,
                    graph_slice,
                });
            }

            debug!(
                run = self.run_id,
                batch = batch_index,
                commits = commits.len(),
                lanes = self.engine.chain_count(),
                "delivering batch"
            );

            if let Some(consumer) = self.consumer.as_mut() {
                consumer.deliver(DeliveredBatch {
                    total_count: batch.total_count,
                    batch_index,
                    commits,
                });
            }

            self.expected_index += 1;
            delivered += 1;
        }

        Ok(delivered)
    }

    fn start_new_run(&mut self) -> RunId {
        self.engine.reset();
        self.pending.clear();
        self.expected_index = 0;
        self.run_failed = false;
        self.run_id += 1;
        info!(run = self.run_id, "starting new run");
        self.run_id
    }
}
