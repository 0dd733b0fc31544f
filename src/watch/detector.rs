// src/watch/detector.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::fs::{FileSystem, content_digest};

/// Remembers the digest of the last seen log content.
#[derive(Debug)]
pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    last_digest: Option<String>,
}

impl ChangeDetector {
    /// Create a detector primed with the file's current content, so the
    /// first real edit is reported as a change.
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_digest = fs.read(&path).ok().map(|bytes| content_digest(&bytes));
        Self {
            fs,
            path,
            last_digest,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_digest(&self) -> Option<&str> {
        self.last_digest.as_deref()
    }

    /// Re-read the file and report whether its content changed since the
    /// last call. A missing or unreadable file is not a change; the next
    /// successful read is compared against the last known content.
    pub fn check(&mut self) -> bool {
        let bytes = match self.fs.read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = ?self.path, error = %err, "commit log unreadable; keeping current run");
                return false;
            }
        };

        let digest = content_digest(&bytes);
        if self.last_digest.as_deref() == Some(digest.as_str()) {
            debug!(path = ?self.path, "commit log event without content change");
            return false;
        }

        debug!(path = ?self.path, %digest, "commit log content changed");
        self.last_digest = Some(digest);
        true
    }
}
