// tests/sequencer.rs
mod common;

use std::error::Error;

use lanegraph::engine::{BatchSequencer, SequencerOptions, SubmitOutcome};
use lanegraph::errors::LaneGraphError;
use lanegraph::graph::{GraphSlice, LaneEngine};
use lanegraph::history::{Commit, CommitInfo};
use lanegraph::types::DuplicateBatchBehaviour;

use crate::common::builders::{batches, commit, feature_branch_history};
use crate::common::{DeliveryRecorder, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

fn sequencer_with(
    options: SequencerOptions,
) -> (BatchSequencer<CommitInfo>, DeliveryRecorder<CommitInfo>, u64) {
    let recorder = DeliveryRecorder::new();
    let mut sequencer = BatchSequencer::new(options);
    let run = sequencer.register_consumer(recorder.consumer());
    (sequencer, recorder, run)
}

fn direct_slices(commits: &[Commit]) -> Vec<GraphSlice> {
    let mut engine = LaneEngine::new();
    commits
        .iter()
        .map(|c| engine.process_commit(c).unwrap())
        .collect()
}

#[test]
fn reverse_arrival_is_delivered_in_index_order() -> TestResult {
    init_tracing();

    let commits = feature_branch_history().build();
    let pages = batches(&commits, 2);
    assert_eq!(pages.len(), 3);

    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    let outcome = sequencer.submit_batch(run, 2, pages[2].clone(), commits.len())?;
    assert_eq!(outcome, SubmitOutcome::Buffered { delivered: 0 });
    let outcome = sequencer.submit_batch(run, 1, pages[1].clone(), commits.len())?;
    assert_eq!(outcome, SubmitOutcome::Buffered { delivered: 0 });
    assert!(recorder.batches().is_empty());
    assert_eq!(sequencer.pending_count(), 2);

    let outcome = sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(outcome, SubmitOutcome::Buffered { delivered: 3 });

    assert_eq!(recorder.batch_indices(), vec![0, 1, 2]);
    assert_eq!(sequencer.expected_index(), 3);
    assert_eq!(sequencer.pending_count(), 0);

    let hashes: Vec<String> = commits.iter().map(|c| c.hash.clone()).collect();
    assert_eq!(recorder.hashes(), hashes);
    assert_eq!(recorder.slices(), direct_slices(&commits));

    let delivered = recorder.batches();
    assert!(delivered.iter().all(|b| b.total_count == commits.len()));
    assert_eq!(delivered[2].commits.len(), 2);
    Ok(())
}

#[test]
fn in_order_batches_are_delivered_immediately() -> TestResult {
    let commits = feature_branch_history().build();
    let pages = batches(&commits, 4);
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(recorder.batch_indices(), vec![0]);

    sequencer.submit_batch(run, 1, pages[1].clone(), commits.len())?;
    assert_eq!(recorder.batch_indices(), vec![0, 1]);
    assert_eq!(recorder.slices(), direct_slices(&commits));
    Ok(())
}

#[test]
fn gap_holds_back_later_batches() -> TestResult {
    let commits = feature_branch_history().build();
    let pages = batches(&commits, 2);
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    sequencer.submit_batch(run, 2, pages[2].clone(), commits.len())?;

    assert_eq!(recorder.batch_indices(), vec![0]);
    assert_eq!(sequencer.expected_index(), 1);
    assert_eq!(sequencer.pending_count(), 1);
    Ok(())
}

#[test]
fn empty_batch_still_advances_the_expected_index() -> TestResult {
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 0, Vec::new(), 0)?;
    assert_eq!(recorder.batch_indices(), vec![0]);
    assert!(recorder.batches()[0].commits.is_empty());
    assert_eq!(sequencer.expected_index(), 1);
    Ok(())
}

#[test]
fn duplicate_batch_is_rejected_by_default() -> TestResult {
    let commits = feature_branch_history().build();
    let pages = batches(&commits, 2);
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    sequencer.submit_batch(run, 2, pages[2].clone(), commits.len())?;

    // Already delivered.
    let err = sequencer
        .submit_batch(run, 0, pages[0].clone(), commits.len())
        .unwrap_err();
    assert!(matches!(
        err,
        LaneGraphError::DuplicateBatch {
            index: 0,
            expected: 1
        }
    ));

    // Already buffered.
    let err = sequencer
        .submit_batch(run, 2, pages[2].clone(), commits.len())
        .unwrap_err();
    assert!(matches!(err, LaneGraphError::DuplicateBatch { index: 2, .. }));

    // Nothing was processed twice.
    assert_eq!(recorder.batch_indices(), vec![0]);
    sequencer.submit_batch(run, 1, pages[1].clone(), commits.len())?;
    assert_eq!(recorder.slices(), direct_slices(&commits));
    Ok(())
}

#[test]
fn duplicate_batch_can_be_ignored() -> TestResult {
    let commits = feature_branch_history().build();
    let pages = batches(&commits, 3);
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions {
        duplicate_behaviour: DuplicateBatchBehaviour::Ignore,
        ..SequencerOptions::default()
    });

    sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    let outcome = sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(outcome, SubmitOutcome::Ignored);

    sequencer.submit_batch(run, 1, pages[1].clone(), commits.len())?;
    assert_eq!(recorder.batch_indices(), vec![0, 1]);
    assert_eq!(recorder.slices(), direct_slices(&commits));
    Ok(())
}

#[test]
fn batches_from_a_superseded_run_are_dropped() -> TestResult {
    init_tracing();

    let commits = feature_branch_history().build();
    let pages = batches(&commits, 3);
    let (mut sequencer, recorder, old_run) = sequencer_with(SequencerOptions::default());

    let new_run = sequencer.restart();
    assert_ne!(old_run, new_run);

    let outcome = sequencer.submit_batch(old_run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(outcome, SubmitOutcome::StaleRun);
    assert!(recorder.batches().is_empty());
    assert_eq!(sequencer.expected_index(), 0);

    sequencer.submit_batch(new_run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(recorder.batch_indices(), vec![0]);
    Ok(())
}

#[test]
fn batch_beyond_the_pending_window_is_rejected() -> TestResult {
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions {
        max_pending_batches: 2,
        ..SequencerOptions::default()
    });

    sequencer.submit_batch(run, 1, vec![commit("aaaa", &[])], 3)?;

    let err = sequencer
        .submit_batch(run, 2, vec![commit("bbbb", &[])], 3)
        .unwrap_err();
    assert!(matches!(
        err,
        LaneGraphError::BatchOutOfWindow {
            index: 2,
            expected: 0,
            limit: 2
        }
    ));
    assert_eq!(sequencer.pending_count(), 1);
    assert!(recorder.batches().is_empty());
    Ok(())
}

#[test]
fn submitting_without_a_consumer_fails() {
    let mut sequencer: BatchSequencer<CommitInfo> = BatchSequencer::new(SequencerOptions::default());
    let run = sequencer.current_run();

    let err = sequencer
        .submit_batch(run, 0, vec![commit("aaaa", &[])], 1)
        .unwrap_err();
    assert!(matches!(err, LaneGraphError::NoConsumer(_)));
}

#[test]
fn registering_a_consumer_starts_a_fresh_run() -> TestResult {
    let commits = feature_branch_history().build();
    let pages = batches(&commits, 3);
    let (mut sequencer, first, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 0, pages[0].clone(), commits.len())?;
    assert_eq!(sequencer.expected_index(), 1);

    let second = DeliveryRecorder::new();
    let next_run = sequencer.register_consumer(second.consumer());
    assert_eq!(next_run, run + 1);
    assert_eq!(sequencer.expected_index(), 0);
    assert_eq!(sequencer.engine().chain_count(), 0);

    // Replaying the same stream yields the same slices.
    sequencer.submit_batch(next_run, 0, pages[0].clone(), commits.len())?;
    sequencer.submit_batch(next_run, 1, pages[1].clone(), commits.len())?;

    assert_eq!(first.batch_indices(), vec![0]);
    assert_eq!(second.slices(), direct_slices(&commits));
    Ok(())
}

#[test]
fn malformed_batch_is_rejected_before_buffering() -> TestResult {
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    let err = sequencer
        .submit_batch(run, 0, vec![commit("aaaa", &["bbbb"]), commit("bbbb", &[""])], 2)
        .unwrap_err();
    assert!(matches!(err, LaneGraphError::MalformedCommit(_)));

    assert_eq!(sequencer.pending_count(), 0);
    assert!(!sequencer.run_failed());
    assert!(recorder.batches().is_empty());

    // A corrected batch 0 is still accepted.
    sequencer.submit_batch(run, 0, vec![commit("aaaa", &["bbbb"]), commit("bbbb", &[])], 2)?;
    assert_eq!(recorder.batch_indices(), vec![0]);
    Ok(())
}

#[test]
fn failed_run_refuses_batches_until_restart() -> TestResult {
    init_tracing();

    let commits = feature_branch_history().build();
    let pages = batches(&commits, 2);
    let (mut sequencer, recorder, run) = sequencer_with(SequencerOptions::default());

    sequencer.submit_batch(run, 2, pages[2].clone(), commits.len())?;
    assert_eq!(sequencer.pending_count(), 1);

    sequencer.fail_run();
    assert!(sequencer.run_failed());
    assert_eq!(sequencer.pending_count(), 0);

    let err = sequencer
        .submit_batch(run, 0, pages[0].clone(), commits.len())
        .unwrap_err();
    assert!(matches!(err, LaneGraphError::RunFailed(r) if r == run));
    assert!(recorder.batches().is_empty());

    let next_run = sequencer.restart();
    assert!(!sequencer.run_failed());
    for (idx, page) in pages.iter().enumerate() {
        sequencer.submit_batch(next_run, idx, page.clone(), commits.len())?;
    }
    assert_eq!(recorder.slices(), direct_slices(&commits));
    Ok(())
}
