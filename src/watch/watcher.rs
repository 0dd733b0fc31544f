// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::detector::ChangeDetector;

/// Handle for the log watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `log_path` and send `RuntimeEvent::RestartRequested` whenever its
/// content changes.
///
/// The parent directory is watched rather than the file itself, so tools
/// that replace the file via rename are picked up too.
pub fn spawn_log_watcher<M: Send + 'static>(
    fs: Arc<dyn FileSystem>,
    log_path: impl Into<PathBuf>,
    runtime_tx: mpsc::Sender<RuntimeEvent<M>>,
) -> Result<WatcherHandle> {
    let log_path = log_path.into();
    let log_path = fs.canonicalize(&log_path).unwrap_or(log_path);
    let watch_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("lanegraph: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("lanegraph: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    info!(path = ?log_path, "watching commit log");

    let mut detector = ChangeDetector::new(fs, log_path.clone());

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !touches(&event, &log_path) {
                continue;
            }

            debug!(kind = ?event.kind, "commit log event");

            if detector.check() {
                info!("commit log changed; restarting run");
                if runtime_tx.send(RuntimeEvent::RestartRequested).await.is_err() {
                    break;
                }
            }
        }
        debug!("log watcher loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn touches(event: &Event, log_path: &Path) -> bool {
    event.paths.iter().any(|p| p == log_path)
}
