// src/config/model.rs

use serde::Deserialize;

use crate::engine::SequencerOptions;
use crate::graph::color::{DEFAULT_PALETTE, LaneColor};
use crate::types::DuplicateBatchBehaviour;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [history]
/// batch_size = 200
/// max_pending_batches = 64
/// duplicate_batch_behaviour = "reject"
///
/// [palette]
/// colors = ["#ffb000", "#dc267f", "#994f00"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub history: HistorySection,

    #[serde(default)]
    pub palette: PaletteSection,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub history: HistorySection,
    pub palette: PaletteSection,
}

impl ConfigFile {
    /// Build without validation. Only used after `validate_raw_config`
    /// succeeded.
    pub(crate) fn new_unchecked(history: HistorySection, palette: PaletteSection) -> Self {
        Self { history, palette }
    }

    pub fn palette_colors(&self) -> Vec<LaneColor> {
        self.palette
            .colors
            .iter()
            .map(|c| LaneColor::new(c.as_str()))
            .collect()
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            max_pending_batches: self.history.max_pending_batches,
            duplicate_behaviour: self.history.duplicate_batch_behaviour,
            palette: self.palette_colors(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(HistorySection::default(), PaletteSection::default())
    }
}

/// `[history]` section: how history is paged and sequenced.
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySection {
    /// Commits per fetched batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How many batches past the next expected one may wait in the buffer.
    #[serde(default = "default_max_pending_batches")]
    pub max_pending_batches: usize,

    /// `"reject"` (default) or `"ignore"`.
    #[serde(default)]
    pub duplicate_batch_behaviour: DuplicateBatchBehaviour,
}

fn default_batch_size() -> usize {
    200
}

fn default_max_pending_batches() -> usize {
    64
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_pending_batches: default_max_pending_batches(),
            duplicate_batch_behaviour: DuplicateBatchBehaviour::default(),
        }
    }
}

/// `[palette]` section: lane colors, used in order and repeated.
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteSection {
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,
}

fn default_colors() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl Default for PaletteSection {
    fn default() -> Self {
        Self {
            colors: default_colors(),
        }
    }
}
