// src/output.rs

//! Writing delivered batches for the CLI.

use std::io::{self, Write};

use crate::engine::{DeliveredBatch, GraphedCommit};
use crate::graph::Line;
use crate::history::CommitInfo;
use crate::types::OutputFormat;

/// Writes delivered batches to `out` in the chosen format.
#[derive(Debug)]
pub struct BatchPrinter<W> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> BatchPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_batch(&mut self, batch: &DeliveredBatch<CommitInfo>) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, batch)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text => {
                for commit in &batch.commits {
                    writeln!(self.out, "{}", format_row(commit))?;
                }
            }
        }
        self.out.flush()
    }
}

/// One text row: lane, color, short hash, line segments, subject.
///
/// Segments read `top>bottom`, with `.` for a lane that starts or ends here.
pub fn format_row(commit: &GraphedCommit<CommitInfo>) -> String {
    let slice = &commit.graph_slice;
    let short: String = commit.commit.hash.chars().take(8).collect();
    let lines: Vec<String> = slice.lines.iter().map(format_line).collect();

    format!(
        "{:>3} {} {:<8} {:<24} {}",
        slice.commit_position,
        slice.commit_color,
        short,
        lines.join(" "),
        commit.commit.meta.subject
    )
    .trim_end()
    .to_string()
}

fn format_line(line: &Line) -> String {
    let side = |lane: Option<usize>| lane.map_or_else(|| ".".to_string(), |l| l.to_string());
    format!("{}>{}", side(line.top), side(line.bottom))
}
