// src/history/mod.rs

//! Commit history input.
//!
//! The lane engine never talks to a version-control backend itself. It is
//! fed through a [`HistoryFetcher`], which answers skip/count requests with
//! batches of commits.
//!
//! - [`fetcher`] defines the fetcher trait and the commit-log-file
//!   implementation used by the CLI.
//! - [`parse`] reads the commit log dump format.
//! - [`order`] checks ancestry order and answers reachability queries.

pub mod fetcher;
pub mod order;
pub mod parse;

use serde::Serialize;

use crate::errors::{LaneGraphError, Result};

pub use fetcher::{HistoryFetcher, LogFileFetcher};
pub use order::{ancestry_graph, check_ancestry_order, reachable_from};
pub use parse::parse_commit_log;

/// A commit as delivered by the history fetcher.
///
/// `meta` is opaque to the lane engine and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit<M = CommitInfo> {
    pub hash: String,
    /// Index 0 is the first parent. Empty for root commits.
    pub parent_hashes: Vec<String>,
    #[serde(flatten)]
    pub meta: M,
}

impl<M> Commit<M> {
    pub fn with_meta(hash: impl Into<String>, parent_hashes: Vec<String>, meta: M) -> Self {
        Self {
            hash: hash.into(),
            parent_hashes,
            meta,
        }
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parent_hashes.first().map(String::as_str)
    }

    /// Parents beyond the first (non-empty only for merge commits).
    pub fn fork_parents(&self) -> impl Iterator<Item = &str> {
        self.parent_hashes.iter().skip(1).map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.parent_hashes.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() > 1
    }

    /// Reject records the lane engine cannot place.
    pub fn validate(&self) -> Result<()> {
        if self.hash.trim().is_empty() {
            return Err(LaneGraphError::MalformedCommit(
                "commit record without a hash".to_string(),
            ));
        }

        if let Some(pos) = self.parent_hashes.iter().position(|p| p.trim().is_empty()) {
            return Err(LaneGraphError::MalformedCommit(format!(
                "commit '{}' has an empty parent hash at position {}",
                self.hash, pos
            )));
        }

        Ok(())
    }
}

impl<M: Default> Commit<M> {
    pub fn new<S: Into<String>>(
        hash: impl Into<String>,
        parent_hashes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_meta(
            hash,
            parent_hashes.into_iter().map(Into::into).collect(),
            M::default(),
        )
    }
}

/// Metadata carried by commits read from a commit log dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub author: String,
    pub subject: String,
}

/// Optional narrowing of the requested history. Opaque to the lane engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Only commits reachable from this reference (a hash prefix for the
    /// log-file fetcher).
    pub reference: Option<String>,
    /// Only commits by one of these authors. Empty means everyone.
    pub authors: Vec<String>,
    /// Only commits whose subject contains this keyword.
    pub keyword: Option<String>,
    /// Backend-specific options, passed through as-is.
    pub options: Vec<String>,
}

/// One skip/count page of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub batch_index: usize,
    pub skip: usize,
    pub max_count: usize,
    pub filter: HistoryFilter,
}

impl FetchRequest {
    /// Request for page `batch_index` with pages of `batch_size` commits.
    pub fn page(batch_index: usize, batch_size: usize, filter: HistoryFilter) -> Self {
        Self {
            batch_index,
            skip: batch_index * batch_size,
            max_count: batch_size,
            filter,
        }
    }
}

/// Answer to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBatch<M = CommitInfo> {
    pub batch_index: usize,
    pub commits: Vec<Commit<M>>,
    /// Number of commits in the whole (filtered) history.
    pub total_count: usize,
}
