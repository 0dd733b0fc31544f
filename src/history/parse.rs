// src/history/parse.rs

//! Commit log dump parsing.
//!
//! The expected format is what
//! `git log --format='%H %P%x09%an%x09%s'` prints, one commit per line:
//!
//! ```text
//! <hash>[ <parent>...][\t<author>[\t<subject>]]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::errors::{LaneGraphError, Result};
use crate::history::{Commit, CommitInfo};

static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<hash>[0-9A-Fa-f]{4,64})(?P<parents>(?: +[0-9A-Fa-f]{4,64})*) *(?:\t(?P<author>[^\t]*)(?:\t(?P<subject>.*))?)?$",
    )
    .expect("commit log line pattern is valid")
});

/// Parse a whole commit log dump, preserving line order.
pub fn parse_commit_log(contents: &str) -> Result<Vec<Commit<CommitInfo>>> {
    let mut commits = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        commits.push(parse_line(idx + 1, line)?);
    }

    debug!(commits = commits.len(), "parsed commit log");
    Ok(commits)
}

fn parse_line(line_no: usize, line: &str) -> Result<Commit<CommitInfo>> {
    let caps = LOG_LINE.captures(line).ok_or_else(|| LaneGraphError::LogParse {
        line: line_no,
        content: line.to_string(),
    })?;

    let parents = caps
        .name("parents")
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let meta = CommitInfo {
        author: caps
            .name("author")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        subject: caps
            .name("subject")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    };

    Ok(Commit::with_meta(&caps["hash"], parents, meta))
}
