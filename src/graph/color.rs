// src/graph/color.rs

//! Deterministic, repeating lane color sequence.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A lane color as handed to the renderer (a hex literal such as `#40b0a6`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneColor(String);

impl LaneColor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LaneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LaneColor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Seven colors that stay distinguishable for most forms of color blindness.
pub const DEFAULT_PALETTE: [&str; 7] = [
    "#ffb000", "#dc267f", "#994f00", "#40b0a6", "#b66dff", "#648fff", "#fe6100",
];

pub fn default_palette() -> Vec<LaneColor> {
    DEFAULT_PALETTE.iter().copied().map(LaneColor::from).collect()
}

/// Cursor over a fixed palette.
///
/// Colors are never handed back by index when a lane closes; they only come
/// around again once the whole palette has been used.
#[derive(Debug, Clone)]
pub struct ColorCycle {
    palette: Vec<LaneColor>,
    /// Index of the color returned by the last `next()`, `None` before the first.
    cursor: Option<usize>,
}

impl ColorCycle {
    /// Build a cycle over `palette`. An empty palette falls back to
    /// [`DEFAULT_PALETTE`].
    pub fn new(palette: Vec<LaneColor>) -> Self {
        let palette = if palette.is_empty() {
            warn!("empty lane palette; falling back to the default palette");
            default_palette()
        } else {
            palette
        };

        Self {
            palette,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// Return the next color, wrapping to the first after the last.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> LaneColor {
        let idx = match self.cursor {
            Some(c) => (c + 1) % self.palette.len(),
            None => 0,
        };
        self.cursor = Some(idx);
        self.palette[idx].clone()
    }

    /// Rewind so the next `next()` returns the first palette color.
    pub fn reset(&mut self) {
        self.cursor = None;
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(default_palette())
    }
}
