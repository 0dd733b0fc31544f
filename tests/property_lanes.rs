// tests/property_lanes.rs
use std::collections::HashSet;

use proptest::prelude::*;

use lanegraph::engine::{BatchSequencer, SequencerOptions};
use lanegraph::graph::{GraphSlice, LaneEngine};
use lanegraph::history::Commit;
use lanegraph_test_utils::builders::{HistoryBuilder, batches};
use lanegraph_test_utils::recorder::DeliveryRecorder;

// Strategy to generate a commit stream in log order.
// Commit i may only name commits i+1.. as parents, so children always come
// first and the history is acyclic.
fn history_strategy(max_commits: usize) -> impl Strategy<Value = Vec<Commit>> {
    (1..=max_commits).prop_flat_map(|len| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), len).prop_map(
            move |raw_parents| {
                let mut builder = HistoryBuilder::new();
                for (i, picks) in raw_parents.into_iter().enumerate() {
                    let later = len - i - 1;
                    let mut seen = HashSet::new();
                    let parents: Vec<String> = picks
                        .into_iter()
                        .filter(|_| later > 0)
                        .map(|p| i + 1 + p % later)
                        .filter(|p| seen.insert(*p))
                        .map(|p| format!("{p:08x}"))
                        .collect();
                    let refs: Vec<&str> = parents.iter().map(String::as_str).collect();
                    builder = builder.commit(&format!("{i:08x}"), &refs);
                }
                builder.build()
            },
        )
    })
}

fn process(commits: &[Commit]) -> Vec<GraphSlice> {
    let mut engine = LaneEngine::new();
    commits
        .iter()
        .map(|c| engine.process_commit(c).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn same_stream_gives_same_slices(commits in history_strategy(40)) {
        prop_assert_eq!(process(&commits), process(&commits));
    }

    #[test]
    fn lanes_are_dense_after_every_commit(commits in history_strategy(40)) {
        let mut engine = LaneEngine::new();
        for commit in &commits {
            let slice = engine.process_commit(commit).unwrap();
            let lanes = engine.chain_count();

            let mut bottoms: Vec<usize> = slice.lines.iter().filter_map(|l| l.bottom).collect();
            bottoms.sort_unstable();
            bottoms.dedup();
            prop_assert_eq!(bottoms, (0..lanes).collect::<Vec<_>>());

            prop_assert!(slice.commit_position <= lanes);
        }
    }

    #[test]
    fn only_awaiting_chains_can_close(commits in history_strategy(40)) {
        let mut engine = LaneEngine::new();
        for commit in &commits {
            let before = engine.chain_count();
            let awaiting = engine
                .chains()
                .iter()
                .filter(|c| c.expected_parent_hash.as_deref() == Some(commit.hash.as_str()))
                .count();

            engine.process_commit(commit).unwrap();
            prop_assert!(engine.chain_count() + awaiting >= before);
        }
    }

    #[test]
    fn delivery_order_does_not_depend_on_arrival_order(
        commits in history_strategy(30),
        batch_size in 1usize..6,
        seed in any::<u64>(),
    ) {
        let pages = batches(&commits, batch_size);

        // Deterministic shuffle of the arrival order.
        let mut order: Vec<usize> = (0..pages.len()).collect();
        let mut state = seed;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            order.swap(i, j);
        }

        let recorder = DeliveryRecorder::new();
        let mut sequencer = BatchSequencer::new(SequencerOptions::default());
        let run = sequencer.register_consumer(recorder.consumer());
        for idx in order {
            sequencer.submit_batch(run, idx, pages[idx].clone(), commits.len()).unwrap();
        }

        prop_assert_eq!(recorder.batch_indices(), (0..pages.len()).collect::<Vec<_>>());
        prop_assert_eq!(recorder.slices(), process(&commits));
    }
}
