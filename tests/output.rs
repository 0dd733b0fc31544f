// tests/output.rs
mod common;

use std::error::Error;

use clap::Parser;

use lanegraph::cli::CliArgs;
use lanegraph::engine::{BatchSequencer, DeliveredBatch, SequencerOptions};
use lanegraph::history::CommitInfo;
use lanegraph::output::{BatchPrinter, format_row};
use lanegraph::types::OutputFormat;

use crate::common::DeliveryRecorder;
use crate::common::builders::feature_branch_history;

type TestResult = Result<(), Box<dyn Error>>;

fn delivered_history() -> Result<DeliveredBatch<CommitInfo>, Box<dyn Error>> {
    let commits = feature_branch_history().build();
    let recorder = DeliveryRecorder::new();
    let mut sequencer = BatchSequencer::new(SequencerOptions::default());
    let run = sequencer.register_consumer(recorder.consumer());
    sequencer.submit_batch(run, 0, commits.clone(), commits.len())?;
    Ok(recorder.batches().remove(0))
}

#[test]
fn text_rows_show_lane_color_hash_and_lines() -> TestResult {
    let batch = delivered_history()?;

    let merge = format_row(&batch.commits[0]);
    assert!(merge.starts_with("  0 #ffb000 aaaa0006 .>0 .>1"));
    assert!(merge.ends_with("Merge feature"));

    let base = format_row(&batch.commits[4]);
    assert!(base.contains("0>0 1>."));
    Ok(())
}

#[test]
fn text_printer_writes_one_row_per_commit() -> TestResult {
    let batch = delivered_history()?;
    let mut printer = BatchPrinter::new(Vec::new(), OutputFormat::Text);
    printer.write_batch(&batch)?;

    let out = String::from_utf8(printer.into_inner())?;
    assert_eq!(out.lines().count(), 6);
    assert!(out.lines().last().unwrap_or_default().contains("Initial commit"));
    Ok(())
}

#[test]
fn json_printer_writes_one_object_per_batch() -> TestResult {
    let batch = delivered_history()?;
    let mut printer = BatchPrinter::new(Vec::new(), OutputFormat::Json);
    printer.write_batch(&batch)?;

    let out = String::from_utf8(printer.into_inner())?;
    assert_eq!(out.lines().count(), 1);

    let value: serde_json::Value = serde_json::from_str(out.trim())?;
    assert_eq!(value["totalCount"], 6);
    assert_eq!(value["batchIndex"], 0);

    let first = &value["commits"][0];
    assert_eq!(first["hash"], "aaaa0006");
    assert_eq!(first["parentHashes"][1], "bbbb0002");
    assert_eq!(first["author"], "alice");
    assert_eq!(first["graphSlice"]["commitPosition"], 0);
    assert_eq!(first["graphSlice"]["lines"][0]["top"], -1);

    let root = &value["commits"][5];
    assert_eq!(root["graphSlice"]["lines"][0]["bottom"], -1);
    Ok(())
}

#[test]
fn cli_flags_build_the_history_filter() -> TestResult {
    let args = CliArgs::try_parse_from([
        "lanegraph",
        "history.log",
        "--ref",
        "abcd",
        "--author",
        "alice",
        "--author",
        "bob",
        "--grep",
        "fix",
        "--batch-size",
        "50",
        "--format",
        "json",
    ])?;

    assert_eq!(args.batch_size, Some(50));
    assert_eq!(args.format, OutputFormat::Json);
    assert!(!args.watch);

    let filter = args.history_filter();
    assert_eq!(filter.reference.as_deref(), Some("abcd"));
    assert_eq!(filter.authors, vec!["alice", "bob"]);
    assert_eq!(filter.keyword.as_deref(), Some("fix"));
    Ok(())
}

#[test]
fn cli_rejects_zero_batch_size() {
    let result = CliArgs::try_parse_from(["lanegraph", "history.log", "--batch-size", "0"]);
    assert!(result.is_err());
}
