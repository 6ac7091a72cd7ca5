//! File system watching and burst coalescing for Savepoint
//!
//! This crate provides:
//! - A notify-based adapter delivering change events over a tokio channel
//! - The debounce trigger that coalesces a burst into one backup cycle
//! - The screenshot hook seam the trigger invokes at arm time

pub mod hook;
pub mod trigger;

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, warn};

// Re-exports
pub use hook::ScreenshotHook;
pub use trigger::{CycleEvent, DebounceTrigger};

/// Capacity of the channel bridging notify's callback thread to the
/// tokio event loop. The trigger discards everything after the first
/// event of a burst anyway, so dropping on overflow loses nothing.
const CHANNEL_CAPACITY: usize = 512;

/// File system event delivered to the trigger.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File modified
    Modify,
    /// File deleted
    Delete,
    /// File renamed
    Rename,
}

/// Recursive watcher over one directory tree.
///
/// Wraps `notify::RecommendedWatcher` and bridges its callback thread
/// into a bounded tokio channel. The watcher must be kept alive:
/// dropping it deregisters the OS watch and stops event delivery.
pub struct TreeWatcher {
    _watcher: notify::RecommendedWatcher,
    rx: mpsc::Receiver<WatchEvent>,
}

impl TreeWatcher {
    /// Start watching `tree` recursively.
    pub fn start(tree: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut watcher = notify::RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for ev in convert(event) {
                        if tx.try_send(ev).is_err() {
                            warn!("watcher channel full, dropping event");
                        }
                    }
                }
                Err(err) => report_watch_error(&err),
            },
            notify::Config::default(),
        )
        .context("failed to create filesystem watcher")?;

        watcher
            .watch(tree, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", tree.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Receive the next event. Returns `None` once the watcher backend
    /// has shut down.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }
}

/// Flatten a notify event into per-path watch events. Access-only
/// notifications carry no change and are dropped here.
fn convert(event: notify::Event) -> Vec<WatchEvent> {
    use notify::event::ModifyKind;

    let kind = match event.kind {
        notify::EventKind::Create(_) => EventKind::Create,
        notify::EventKind::Modify(ModifyKind::Name(_)) => EventKind::Rename,
        notify::EventKind::Modify(_) => EventKind::Modify,
        notify::EventKind::Remove(_) => EventKind::Delete,
        notify::EventKind::Access(_) => return Vec::new(),
        notify::EventKind::Any | notify::EventKind::Other => EventKind::Modify,
    };

    event
        .paths
        .into_iter()
        .map(|path| WatchEvent { path, kind })
        .collect()
}

/// Report a watch-mechanism failure (e.g. kernel queue overflow) with
/// its full cause chain. Non-fatal: the session keeps running.
fn report_watch_error(err: &notify::Error) {
    error!("filesystem watcher error: {err}");
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        error!("  caused by: {inner}");
        cause = inner.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};

    fn event(kind: notify::EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn converts_change_kinds() {
        let created = convert(event(
            notify::EventKind::Create(CreateKind::File),
            "/tmp/save1.dat",
        ));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, EventKind::Create);
        assert_eq!(created[0].path, PathBuf::from("/tmp/save1.dat"));

        let modified = convert(event(
            notify::EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/tmp/save1.dat",
        ));
        assert_eq!(modified[0].kind, EventKind::Modify);

        let renamed = convert(event(
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            "/tmp/save1.dat",
        ));
        assert_eq!(renamed[0].kind, EventKind::Rename);

        let removed = convert(event(
            notify::EventKind::Remove(RemoveKind::File),
            "/tmp/save1.dat",
        ));
        assert_eq!(removed[0].kind, EventKind::Delete);
    }

    #[test]
    fn drops_access_events() {
        let events = convert(event(
            notify::EventKind::Access(AccessKind::Read),
            "/tmp/save1.dat",
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn multi_path_events_fan_out() {
        let ev = notify::Event::new(notify::EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/a"))
            .add_path(PathBuf::from("/tmp/b"));
        assert_eq!(convert(ev).len(), 2);
    }
}
