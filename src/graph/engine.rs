// src/graph/engine.rs

//! Lane assignment state machine.
//!
//! Commits are fed one at a time in history-log order (children before
//! parents). For each commit the engine decides which lane holds the commit
//! node and which line segments connect the row to the one above it.
//!
//! The first parent always inherits the lane (and color) the commit was
//! found on. Additional parents either fan into a lane that already waits for
//! the same commit or open a new lane on the right.

use std::collections::HashSet;

use tracing::trace;

use crate::errors::Result;
use crate::graph::color::{ColorCycle, LaneColor, default_palette};
use crate::graph::slice::{GraphSlice, Line};
use crate::history::Commit;

/// An open lane waiting to be continued by the commit whose hash equals
/// `expected_parent_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub head_hash: String,
    /// `None` once the lane reached a root commit.
    pub expected_parent_hash: Option<String>,
    pub color: LaneColor,
}

impl Chain {
    fn awaits(&self, hash: &str) -> bool {
        self.expected_parent_hash.as_deref() == Some(hash)
    }
}

/// Per-run lane state.
///
/// One engine instance corresponds to one continuous commit stream. Feed it
/// commits strictly in stream order; call [`LaneEngine::reset`] before
/// replaying or starting a different stream.
#[derive(Debug, Clone)]
pub struct LaneEngine {
    /// Chain index == lane index. Kept dense after every commit.
    chains: Vec<Chain>,
    /// Lines emitted for the previous row.
    lines: Vec<Line>,
    colors: ColorCycle,
}

impl LaneEngine {
    pub fn new() -> Self {
        Self::with_palette(default_palette())
    }

    pub fn with_palette(palette: Vec<LaneColor>) -> Self {
        Self {
            chains: Vec::new(),
            lines: Vec::new(),
            colors: ColorCycle::new(palette),
        }
    }

    /// Number of lanes currently open.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Lines produced for the most recent row.
    pub fn previous_lines(&self) -> &[Line] {
        &self.lines
    }

    /// Drop all lanes and rewind the color cycle.
    pub fn reset(&mut self) {
        self.chains.clear();
        self.lines.clear();
        self.colors.reset();
    }

    /// Assign a lane to `commit` and compute its row of lines.
    ///
    /// Malformed commits are rejected before any state changes, so a failed
    /// call leaves the engine exactly as it was.
    pub fn process_commit<M>(&mut self, commit: &Commit<M>) -> Result<GraphSlice> {
        commit.validate()?;

        let hash = commit.hash.as_str();
        let first_parent = commit.first_parent();
        let mut lines = carry_forward(&self.lines);

        let awaiting: Vec<usize> = self
            .chains
            .iter()
            .enumerate()
            .filter(|(_, chain)| chain.awaits(hash))
            .map(|(idx, _)| idx)
            .collect();

        let (commit_position, commit_color) = match awaiting.first() {
            Some(&position) => {
                self.continue_chain(position, hash, first_parent, &awaiting, &mut lines)
            }
            None => self.open_chain(hash, first_parent, &mut lines),
        };

        for parent in commit.fork_parents() {
            self.fork(hash, parent, &mut lines);
        }

        trace!(
            commit = %hash,
            position = commit_position,
            lanes = self.chains.len(),
            lines = lines.len(),
            "assigned lane"
        );

        self.lines = lines.clone();

        Ok(GraphSlice {
            commit_position,
            commit_color,
            lines,
        })
    }

    /// The commit was awaited by one or more chains: it takes the first of
    /// them, and the rest converge into it.
    fn continue_chain(
        &mut self,
        position: usize,
        hash: &str,
        first_parent: Option<&str>,
        awaiting: &[usize],
        lines: &mut [Line],
    ) -> (usize, LaneColor) {
        let chain = &mut self.chains[position];
        chain.head_hash = hash.to_string();
        chain.expected_parent_hash = first_parent.map(str::to_string);
        let color = chain.color.clone();

        // Without a first parent the surviving lane ends here as well.
        let merged = if first_parent.is_some() {
            &awaiting[1..]
        } else {
            awaiting
        };

        let removed = self.remove_chains(merged);

        let mut next_lane = 0;
        for line in lines.iter_mut() {
            let closes = line
                .top
                .is_some_and(|lane| removed.get(lane).copied().unwrap_or(false));
            if closes {
                line.bottom = None;
            } else {
                line.bottom = Some(next_lane);
                next_lane += 1;
            }
        }
        debug_assert_eq!(next_lane, self.chains.len(), "lanes must stay dense");

        (position, color)
    }

    /// Nobody waits for this commit: it starts a lane of its own.
    fn open_chain(
        &mut self,
        hash: &str,
        first_parent: Option<&str>,
        lines: &mut Vec<Line>,
    ) -> (usize, LaneColor) {
        let color = self.colors.next();
        let position = self.chains.len();

        let bottom = first_parent.map(|parent| {
            self.chains.push(Chain {
                head_hash: hash.to_string(),
                expected_parent_hash: Some(parent.to_string()),
                color: color.clone(),
            });
            position
        });

        lines.push(Line::new(None, bottom, color.clone()));
        (position, color)
    }

    fn fork(&mut self, hash: &str, parent: &str, lines: &mut Vec<Line>) {
        if let Some((idx, chain)) = self
            .chains
            .iter()
            .enumerate()
            .find(|(_, chain)| chain.awaits(parent))
        {
            // Fan-in: another lane already waits for this parent.
            lines.push(Line::new(None, Some(idx), chain.color.clone()));
            return;
        }

        let color = self.colors.next();
        self.chains.push(Chain {
            head_hash: hash.to_string(),
            expected_parent_hash: Some(parent.to_string()),
            color: color.clone(),
        });
        lines.push(Line::new(None, Some(self.chains.len() - 1), color));
    }

    /// Remove the chains at `indices` with a single compaction pass.
    ///
    /// Returns a mask over the pre-removal indices marking removed chains.
    fn remove_chains(&mut self, indices: &[usize]) -> Vec<bool> {
        let mut removed = vec![false; self.chains.len()];
        for &idx in indices {
            removed[idx] = true;
        }

        if indices.is_empty() {
            return removed;
        }

        let mut write = 0;
        for read in 0..self.chains.len() {
            if removed[read] {
                continue;
            }
            if write != read {
                self.chains.swap(write, read);
            }
            write += 1;
        }
        self.chains.truncate(write);

        removed
    }
}

impl Default for LaneEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn the previous row's open lines into this row's incoming lines.
fn carry_forward(previous: &[Line]) -> Vec<Line> {
    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(previous.len());

    for line in previous {
        let Some(lane) = line.bottom else {
            continue;
        };
        if !seen.insert(lane) {
            continue;
        }
        lines.push(Line::new(Some(lane), Some(lane), line.color.clone()));
    }

    lines
}
