use std::sync::{Arc, Mutex};

use lanegraph::engine::DeliveredBatch;
use lanegraph::graph::GraphSlice;

/// Collects every delivered batch so tests can inspect delivery order and
/// the computed graph slices.
#[derive(Debug)]
pub struct DeliveryRecorder<M> {
    batches: Arc<Mutex<Vec<DeliveredBatch<M>>>>,
}

impl<M> Clone for DeliveryRecorder<M> {
    fn clone(&self) -> Self {
        Self {
            batches: Arc::clone(&self.batches),
        }
    }
}

impl<M> Default for DeliveryRecorder<M> {
    fn default() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<M: Clone + Send + 'static> DeliveryRecorder<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consumer closure that appends into this recorder.
    pub fn consumer(&self) -> impl FnMut(DeliveredBatch<M>) + Send + 'static {
        let batches = Arc::clone(&self.batches);
        move |batch| batches.lock().unwrap().push(batch)
    }

    pub fn batches(&self) -> Vec<DeliveredBatch<M>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_indices(&self) -> Vec<usize> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.batch_index)
            .collect()
    }

    /// Commit hashes in delivery order.
    pub fn hashes(&self) -> Vec<String> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.commits.iter().map(|c| c.commit.hash.clone()))
            .collect()
    }

    /// Graph slices in delivery order.
    pub fn slices(&self) -> Vec<GraphSlice> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flat_map(|b| b.commits.iter().map(|c| c.graph_slice.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.batches.lock().unwrap().clear();
    }
}
