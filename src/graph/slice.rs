// src/graph/slice.rs

//! Per-row output of the lane engine.

use serde::{Serialize, Serializer};

use crate::graph::color::LaneColor;

/// Lane index used on the wire for "no connection on this side".
pub const NO_LANE: i64 = -1;

/// One line segment between the previous row and the current row.
///
/// `top` is the lane the segment enters from (the previous row), `bottom` the
/// lane it leaves through. `None` on either side means the lane starts or
/// ends at this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    #[serde(serialize_with = "serialize_lane")]
    pub top: Option<usize>,
    #[serde(serialize_with = "serialize_lane")]
    pub bottom: Option<usize>,
    pub color: LaneColor,
}

impl Line {
    pub fn new(top: Option<usize>, bottom: Option<usize>, color: LaneColor) -> Self {
        Self { top, bottom, color }
    }
}

/// Graph data for a single commit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSlice {
    /// Lane holding the commit's own node marker.
    pub commit_position: usize,
    pub commit_color: LaneColor,
    pub lines: Vec<Line>,
}

fn serialize_lane<S>(lane: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match lane {
        Some(idx) => serializer.serialize_u64(*idx as u64),
        None => serializer.serialize_i64(NO_LANE),
    }
}
