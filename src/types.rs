use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Behaviour when a batch arrives for an index that was already delivered or
/// is already waiting in the pending buffer.
///
/// - `Reject`: return [`crate::errors::LaneGraphError::DuplicateBatch`] to the
///   caller (default). The run's state is left untouched.
/// - `Ignore`: drop the batch silently (logged at `warn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateBatchBehaviour {
    Reject,
    Ignore,
}

impl Default for DuplicateBatchBehaviour {
    fn default() -> Self {
        DuplicateBatchBehaviour::Reject
    }
}

impl FromStr for DuplicateBatchBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(DuplicateBatchBehaviour::Reject),
            "ignore" => Ok(DuplicateBatchBehaviour::Ignore),
            other => Err(format!(
                "invalid duplicate_batch_behaviour: {other} (expected \"reject\" or \"ignore\")"
            )),
        }
    }
}

/// How delivered batches are written by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable row per commit.
    Text,
    /// One JSON object per delivered batch.
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}
