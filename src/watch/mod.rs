// src/watch/mod.rs

//! Watch mode: restart the run whenever the commit log changes.
//!
//! - [`detector`] decides whether the log content actually changed
//!   (blake3 digest), so touch/metadata events do not restart the run.
//! - [`watcher`] wires a `notify` watcher to the runtime event channel.

pub mod detector;
pub mod watcher;

pub use detector::ChangeDetector;
pub use watcher::{WatcherHandle, spawn_log_watcher};
