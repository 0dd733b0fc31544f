use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lanegraph::errors::{LaneGraphError, Result};
use lanegraph::history::{Commit, FetchRequest, FetchedBatch, HistoryFetcher};

/// In-memory history fetcher with scriptable latency and failures.
///
/// Pages are served from a fixed commit list with skip/count semantics. Each
/// batch index can be delayed or made to fail, so tests can force batches to
/// complete out of order.
#[derive(Debug)]
pub struct ScriptedFetcher<M> {
    commits: Arc<Mutex<Vec<Commit<M>>>>,
    delays: HashMap<usize, Duration>,
    failing: HashSet<usize>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    completed: Arc<Mutex<Vec<usize>>>,
}

impl<M: Clone + Send + Sync + 'static> ScriptedFetcher<M> {
    pub fn new(commits: Vec<Commit<M>>) -> Self {
        Self {
            commits: Arc::new(Mutex::new(commits)),
            delays: HashMap::new(),
            failing: HashSet::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay batch `index` by `delay` before answering.
    pub fn delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// Make later batches finish first: batch `i` (for `i >= 1`) waits
    /// `step * (batches - i)`. Batch 0 answers immediately.
    pub fn reverse_completion(mut self, batches: usize, step: Duration) -> Self {
        for idx in 1..batches {
            let factor = u32::try_from(batches - idx).unwrap_or(u32::MAX);
            self.delays.insert(idx, step * factor);
        }
        self
    }

    /// Fail every fetch of batch `index`.
    pub fn fail(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    /// Replace the served history (e.g. to simulate a new commit).
    pub fn set_commits(&self, commits: Vec<Commit<M>>) {
        *self.commits.lock().unwrap() = commits;
    }

    /// Requests in the order they were received.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Batch indices in the order their fetches completed successfully.
    pub fn completed(&self) -> Vec<usize> {
        self.completed.lock().unwrap().clone()
    }
}

impl<M: Clone + Send + Sync + 'static> HistoryFetcher for ScriptedFetcher<M> {
    type Meta = M;

    fn fetch(
        &self,
        request: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedBatch<M>>> + Send + '_>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());

            if let Some(delay) = self.delays.get(&request.batch_index) {
                tokio::time::sleep(*delay).await;
            }

            if self.failing.contains(&request.batch_index) {
                return Err(LaneGraphError::Fetch {
                    batch_index: request.batch_index,
                    message: "scripted failure".to_string(),
                });
            }

            let (page, total_count) = {
                let commits = self.commits.lock().unwrap();
                let page: Vec<Commit<M>> = commits
                    .iter()
                    .skip(request.skip)
                    .take(request.max_count)
                    .cloned()
                    .collect();
                (page, commits.len())
            };

            self.completed.lock().unwrap().push(request.batch_index);

            Ok(FetchedBatch {
                batch_index: request.batch_index,
                commits: page,
                total_count,
            })
        })
    }
}
