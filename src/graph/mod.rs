// src/graph/mod.rs

//! Lane graph computation.
//!
//! - [`color`] holds the repeating lane palette.
//! - [`engine`] contains the per-run lane assignment state machine.
//! - [`slice`] defines the per-commit output rows.

pub mod color;
pub mod engine;
pub mod slice;

pub use color::{ColorCycle, DEFAULT_PALETTE, LaneColor};
pub use engine::{Chain, LaneEngine};
pub use slice::{GraphSlice, Line, NO_LANE};
