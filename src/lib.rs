// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod history;
pub mod logging;
pub mod output;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::engine::{
    BatchSequencer, CoreRuntime, DeliveredBatch, Runtime, RuntimeEvent, RuntimeOptions,
};
use crate::fs::{FileSystem, RealFileSystem};
use crate::history::{CommitInfo, LogFileFetcher, check_ancestry_order};
use crate::output::BatchPrinter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the log file fetcher
/// - sequencer / core / runtime
/// - the stdout printer as batch consumer
/// - (optional) log watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let fetcher = Arc::new(LogFileFetcher::with_fs(Arc::clone(&fs), &args.log));

    if args.check_order {
        let commits = fetcher.load()?;
        check_ancestry_order(commits.as_slice())?;
        println!("{}: {} commits in ancestry order", args.log.display(), commits.len());
        return Ok(());
    }

    let batch_size = match args.batch_size {
        Some(n) => usize::try_from(n).context("--batch-size does not fit in usize")?,
        None => cfg.history.batch_size,
    };

    let mut sequencer = BatchSequencer::new(cfg.sequencer_options());
    let mut printer = BatchPrinter::new(std::io::stdout(), args.format);
    sequencer.register_consumer(move |batch: DeliveredBatch<CommitInfo>| {
        if let Err(err) = printer.write_batch(&batch) {
            warn!(batch = batch.batch_index, error = %err, "failed to write batch");
        }
    });

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Optional log watcher (only in --watch mode).
    let _watcher_handle = if args.watch {
        Some(watch::spawn_log_watcher(
            Arc::clone(&fs),
            args.log.clone(),
            rt_tx.clone(),
        )?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(
        log = ?args.log,
        batch_size,
        watch = args.watch,
        "computing lane graph"
    );

    let options = RuntimeOptions {
        exit_when_complete: !args.watch,
    };

    let core = CoreRuntime::new(sequencer, batch_size, args.history_filter(), options);
    let runtime = Runtime::new(core, rt_tx, rt_rx, fetcher);
    runtime.run().await?;

    Ok(())
}
