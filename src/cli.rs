// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::history::HistoryFilter;
use crate::types::OutputFormat;

/// Command-line arguments for `lanegraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lanegraph",
    version,
    about = "Compute commit graph lanes for a history log, batch by batch.",
    long_about = None
)]
pub struct CliArgs {
    /// Commit log dump, one commit per line, children before parents.
    ///
    /// Produce it with `git log --format='%H %P%x09%an%x09%s'`.
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Lanegraph.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Commits per batch; overrides `[history].batch_size`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Output format for delivered batches.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Keep running and recompute the graph whenever the log file changes.
    #[arg(long)]
    pub watch: bool,

    /// Only check that the log is in ancestry order, then exit.
    #[arg(long)]
    pub check_order: bool,

    /// Only commits reachable from this hash prefix.
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Only commits by this author (repeatable).
    #[arg(long, value_name = "NAME")]
    pub author: Vec<String>,

    /// Only commits whose subject contains this keyword.
    #[arg(long, value_name = "KEYWORD")]
    pub grep: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LANEGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    pub fn history_filter(&self) -> HistoryFilter {
        HistoryFilter {
            reference: self.reference.clone(),
            authors: self.author.clone(),
            keyword: self.grep.clone(),
            options: Vec::new(),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
