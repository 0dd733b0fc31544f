// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::core::CoreRuntime;
use crate::engine::{CoreCommand, RunId, RuntimeEvent};
use crate::errors::{LaneGraphError, Result};
use crate::history::{FetchRequest, HistoryFetcher};

/// Drives the core runtime in response to `RuntimeEvent`s and delegates
/// history fetching to a `HistoryFetcher`.
///
/// This is the single owner of the sequencer and lane engine: every batch,
/// however concurrently it was fetched, is submitted from this one task, so
/// commits reach the lane engine strictly one after another.
pub struct Runtime<F: HistoryFetcher> {
    core: CoreRuntime<F::Meta>,
    event_tx: mpsc::Sender<RuntimeEvent<F::Meta>>,
    event_rx: mpsc::Receiver<RuntimeEvent<F::Meta>>,
    fetcher: Arc<F>,
}

impl<F: HistoryFetcher> fmt::Debug for Runtime<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("sequencer", self.core.sequencer())
            .field("plan", self.core.plan())
            .finish_non_exhaustive()
    }
}

impl<F> Runtime<F>
where
    F: HistoryFetcher + 'static,
{
    /// `event_tx` must be the sending half of `event_rx`; fetch tasks report
    /// back through it. Keep other clones (watcher, Ctrl-C handler) to inject
    /// restart and shutdown events.
    pub fn new(
        core: CoreRuntime<F::Meta>,
        event_tx: mpsc::Sender<RuntimeEvent<F::Meta>>,
        event_rx: mpsc::Receiver<RuntimeEvent<F::Meta>>,
        fetcher: Arc<F>,
    ) -> Self {
        Self {
            core,
            event_tx,
            event_rx,
            fetcher,
        }
    }

    /// Main event loop.
    ///
    /// - Requests the first batch of the current run.
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (spawn fetches, fail, exit).
    pub async fn run(mut self) -> Result<()> {
        info!("lanegraph runtime started");

        let step = self.core.start_run();
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command)?;
        }

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(event = event.kind(), "runtime received event");

            let step = self.core.step(event)?;

            for command in step.commands {
                self.execute_command(command)?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                keep_running = false;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Execute a single command from the core.
    fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::FetchBatches { run, requests } => {
                self.spawn_fetches(run, requests);
            }
            CoreCommand::FailRun {
                run,
                batch_index,
                message,
            } => {
                if self.core.options().exit_when_complete {
                    return Err(LaneGraphError::Fetch {
                        batch_index,
                        message,
                    });
                }
                error!(
                    run,
                    batch = batch_index,
                    "run stalled on a failed batch; waiting for a restart"
                );
            }
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    /// Fire-and-forget one task per request. Results come back over the
    /// event channel tagged with `run`, in whatever order they complete.
    fn spawn_fetches(&self, run: RunId, requests: Vec<FetchRequest>) {
        let indices: Vec<_> = requests.iter().map(|r| r.batch_index).collect();
        debug!(run, ?indices, "spawning history fetches");

        for request in requests {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = self.event_tx.clone();

            tokio::spawn(async move {
                let batch_index = request.batch_index;
                let event = match fetcher.fetch(request).await {
                    Ok(batch) => RuntimeEvent::BatchFetched { run, batch },
                    Err(err) => RuntimeEvent::FetchFailed {
                        run,
                        batch_index,
                        message: err.to_string(),
                    },
                };

                if tx.send(event).await.is_err() {
                    debug!(run, batch = batch_index, "runtime gone; dropping fetch result");
                }
            });
        }
    }
}
