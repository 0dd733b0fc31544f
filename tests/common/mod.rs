#![allow(dead_code, unused_imports)]

pub use lanegraph_test_utils::builders;
pub use lanegraph_test_utils::fake_fetcher::ScriptedFetcher;
pub use lanegraph_test_utils::recorder::DeliveryRecorder;
pub use lanegraph_test_utils::{init_tracing, with_timeout};

use lanegraph::graph::{LaneColor, Line};

/// Palette color `n` of the default palette.
pub fn color(n: usize) -> LaneColor {
    LaneColor::new(lanegraph::graph::DEFAULT_PALETTE[n % lanegraph::graph::DEFAULT_PALETTE.len()])
}

/// Shorthand for a line between lanes (`None` is "no lane").
pub fn line(top: Option<usize>, bottom: Option<usize>, color_idx: usize) -> Line {
    Line::new(top, bottom, color(color_idx))
}
