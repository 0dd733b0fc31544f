// src/history/order.rs

//! Ancestry checks over a loaded commit list.

use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use tracing::warn;

use crate::errors::{LaneGraphError, Result};
use crate::history::Commit;

/// Build the child -> parent graph of `commits`.
///
/// Parents that are not part of the list still become nodes, so the graph
/// describes every edge the log mentions.
pub fn ancestry_graph<M>(commits: &[Commit<M>]) -> DiGraphMap<&str, ()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for commit in commits {
        graph.add_node(commit.hash.as_str());
        for parent in &commit.parent_hashes {
            graph.add_edge(commit.hash.as_str(), parent.as_str(), ());
        }
    }

    graph
}

/// Verify that `commits` is a valid lane engine input stream: no duplicate
/// hashes, no cycles, and every commit listed before all of its parents that
/// appear in the list.
pub fn check_ancestry_order<M>(commits: &[Commit<M>]) -> Result<()> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(commits.len());
    for (idx, commit) in commits.iter().enumerate() {
        if position.insert(commit.hash.as_str(), idx).is_some() {
            return Err(LaneGraphError::AncestryOrder(format!(
                "commit '{}' appears more than once",
                commit.hash
            )));
        }
    }

    let graph = ancestry_graph(commits);
    if is_cyclic_directed(&graph) {
        return Err(LaneGraphError::AncestryOrder(
            "parent links form a cycle".to_string(),
        ));
    }

    for (idx, commit) in commits.iter().enumerate() {
        for parent in &commit.parent_hashes {
            if let Some(&parent_idx) = position.get(parent.as_str())
                && parent_idx < idx
            {
                return Err(LaneGraphError::AncestryOrder(format!(
                    "commit '{}' (row {}) is listed after its parent '{}' (row {})",
                    commit.hash, idx, parent, parent_idx
                )));
            }
        }
    }

    Ok(())
}

/// Hashes of all commits reachable from the first commit whose hash starts
/// with `reference`, including that commit. Empty if nothing matches.
pub fn reachable_from<M>(commits: &[Commit<M>], reference: &str) -> HashSet<String> {
    let Some(start) = commits.iter().find(|c| c.hash.starts_with(reference)) else {
        warn!(reference = %reference, "reference not found in commit log");
        return HashSet::new();
    };

    let graph = ancestry_graph(commits);
    let mut dfs = Dfs::new(&graph, start.hash.as_str());
    let mut reachable = HashSet::new();

    while let Some(node) = dfs.next(&graph) {
        reachable.insert(node.to_string());
    }

    reachable
}
