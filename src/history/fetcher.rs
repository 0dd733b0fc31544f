// src/history/fetcher.rs

//! Pluggable history source.
//!
//! The runtime asks a [`HistoryFetcher`] for skip/count pages of history and
//! may have several requests in flight at once. Production code in this crate
//! uses [`LogFileFetcher`], which serves pages out of a commit log dump;
//! tests provide fetchers that complete requests in whatever order they like.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem, content_digest};
use crate::history::order::reachable_from;
use crate::history::parse::parse_commit_log;
use crate::history::{Commit, CommitInfo, FetchRequest, FetchedBatch, HistoryFilter};

/// Trait abstracting where commit batches come from.
///
/// `fetch` takes `&self` so one fetcher can serve concurrent requests.
pub trait HistoryFetcher: Send + Sync {
    /// Opaque per-commit metadata carried through to the consumer.
    type Meta: Send + 'static;

    fn fetch(
        &self,
        request: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedBatch<Self::Meta>>> + Send + '_>>;
}

/// Parsed log plus the digest of the bytes it was parsed from.
#[derive(Debug)]
struct CachedLog {
    digest: String,
    commits: Arc<Vec<Commit<CommitInfo>>>,
}

/// Serves history pages from a commit log dump on disk.
///
/// The file is re-read on every request so edits show up in the next run;
/// parsing only happens again when the content digest changes.
#[derive(Debug)]
pub struct LogFileFetcher {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    cache: Mutex<Option<CachedLog>>,
}

impl LogFileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(Arc::new(RealFileSystem), path)
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load (or reuse) the parsed commit log.
    pub fn load(&self) -> Result<Arc<Vec<Commit<CommitInfo>>>> {
        let bytes = self.fs.read(&self.path)?;
        let digest = content_digest(&bytes);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref()
            && cached.digest == digest
        {
            return Ok(Arc::clone(&cached.commits));
        }

        debug!(path = ?self.path, %digest, "commit log changed; parsing");
        let text = String::from_utf8(bytes)
            .with_context(|| format!("commit log {:?} is not valid UTF-8", self.path))?;
        let commits = Arc::new(parse_commit_log(&text)?);

        *cache = Some(CachedLog {
            digest,
            commits: Arc::clone(&commits),
        });

        Ok(commits)
    }

    /// Answer a request synchronously.
    pub fn select(&self, request: &FetchRequest) -> Result<FetchedBatch<CommitInfo>> {
        let commits = self.load()?;
        let matching = apply_filter(&commits, &request.filter);

        let page: Vec<Commit<CommitInfo>> = matching
            .iter()
            .skip(request.skip)
            .take(request.max_count)
            .map(|c| (*c).clone())
            .collect();

        debug!(
            batch = request.batch_index,
            skip = request.skip,
            returned = page.len(),
            total = matching.len(),
            "served history page"
        );

        Ok(FetchedBatch {
            batch_index: request.batch_index,
            commits: page,
            total_count: matching.len(),
        })
    }
}

impl HistoryFetcher for LogFileFetcher {
    type Meta = CommitInfo;

    fn fetch(
        &self,
        request: FetchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedBatch<CommitInfo>>> + Send + '_>> {
        Box::pin(async move { self.select(&request) })
    }
}

fn apply_filter<'a>(
    commits: &'a [Commit<CommitInfo>],
    filter: &HistoryFilter,
) -> Vec<&'a Commit<CommitInfo>> {
    if !filter.options.is_empty() {
        debug!(options = ?filter.options, "log file fetcher ignores backend options");
    }

    let reachable = filter
        .reference
        .as_deref()
        .map(|reference| reachable_from(commits, reference));
    let keyword = filter.keyword.as_ref().map(|k| k.to_lowercase());

    commits
        .iter()
        .filter(|c| reachable.as_ref().is_none_or(|set| set.contains(&c.hash)))
        .filter(|c| filter.authors.is_empty() || filter.authors.contains(&c.meta.author))
        .filter(|c| {
            keyword
                .as_ref()
                .is_none_or(|k| c.meta.subject.to_lowercase().contains(k))
        })
        .collect()
}
