// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaneGraphError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Malformed commit: {0}")]
    MalformedCommit(String),

    #[error("Duplicate batch {index} (next expected batch is {expected})")]
    DuplicateBatch { index: usize, expected: usize },

    #[error("Batch {index} is outside the pending window ({expected}..{limit})")]
    BatchOutOfWindow {
        index: usize,
        expected: usize,
        limit: usize,
    },

    #[error("No consumer registered for run {0}")]
    NoConsumer(u64),

    #[error("Run {0} failed earlier; start a new run")]
    RunFailed(u64),

    #[error("Fetching batch {batch_index} failed: {message}")]
    Fetch { batch_index: usize, message: String },

    #[error("Commit log line {line} could not be parsed: {content:?}")]
    LogParse { line: usize, content: String },

    #[error("Commit log is not in ancestry order: {0}")]
    AncestryOrder(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LaneGraphError>;
