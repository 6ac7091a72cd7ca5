//! Debounce trigger: one backup cycle per burst of change events
//!
//! The first qualifying event of a burst arms a cycle: it fixes the
//! snapshot id, captures the screenshot, and starts the quiet-period
//! timer. Every further event while the cycle is pending is discarded —
//! the timer is deliberately NOT reset, so a burst longer than the quiet
//! period still produces exactly one backup. When the timer fires the
//! commit runs on a blocking worker, and only after it returns does the
//! gate reopen for the next burst. Commits are therefore serialized.

use crate::hook::ScreenshotHook;
use crate::WatchEvent;
use savepoint_core::{BackupCommitter, SnapshotId, SnapshotNamer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Lifecycle notifications for one backup cycle.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    /// A burst started: the cycle is armed and the quiet period runs.
    Armed { id: SnapshotId },
    /// The commit finished and the archive is in the store.
    Committed {
        id: SnapshotId,
        archive: PathBuf,
        files: u64,
    },
    /// The commit failed; the store holds no partial state for this id.
    Failed { id: SnapshotId, error: String },
}

struct Inner {
    /// Single-flight gate: true while a cycle is armed or committing.
    armed: AtomicBool,
    namer: SnapshotNamer,
    committer: BackupCommitter,
    hook: Arc<dyn ScreenshotHook>,
    quiet_period: Duration,
    events: broadcast::Sender<CycleEvent>,
}

/// Converts a noisy event stream into at most one backup cycle per
/// quiet period. Cheap to clone; clones share the gate.
#[derive(Clone)]
pub struct DebounceTrigger {
    inner: Arc<Inner>,
}

impl DebounceTrigger {
    pub fn new(
        committer: BackupCommitter,
        hook: Arc<dyn ScreenshotHook>,
        quiet_period: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                armed: AtomicBool::new(false),
                namer: SnapshotNamer::new(),
                committer,
                hook,
                quiet_period,
                events,
            }),
        }
    }

    /// Subscribe to cycle lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a cycle is currently pending (armed or committing).
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }

    /// Feed one filesystem event into the trigger.
    ///
    /// Must be called from within a tokio runtime: arming a cycle spawns
    /// the delayed commit task. The screenshot hook runs synchronously
    /// here, so it must return quickly.
    pub fn handle_event(&self, event: &WatchEvent) {
        // Directory notifications never arm a cycle and never touch an
        // armed one. A path that no longer exists is a file change.
        if event.path.is_dir() {
            return;
        }

        // try-arm: losers of the exchange are mid-burst events and are
        // absorbed without effect.
        if self
            .inner
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let id = self.inner.namer.next();
        info!(id = %id, path = %event.path.display(), "change detected, backup cycle armed");

        self.capture_screenshot(&id);
        let _ = self.inner.events.send(CycleEvent::Armed { id: id.clone() });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            run_cycle(inner, id).await;
        });
    }

    /// Best effort: a failed capture costs the cycle its screenshot,
    /// never the backup.
    fn capture_screenshot(&self, id: &SnapshotId) {
        let path = self.inner.committer.store().screenshot_path(id);
        match self.inner.hook.capture() {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&path, bytes) {
                    warn!(id = %id, "failed to write screenshot {}: {err}", path.display());
                }
            }
            Err(err) => {
                warn!(id = %id, "screenshot capture failed: {err:#}");
            }
        }
    }
}

/// Reopens the single-flight gate when dropped, on every exit path of
/// the cycle task — including a panicking commit worker.
struct GateReset(Arc<Inner>);

impl Drop for GateReset {
    fn drop(&mut self) {
        self.0.armed.store(false, Ordering::Release);
    }
}

async fn run_cycle(inner: Arc<Inner>, id: SnapshotId) {
    let reset = GateReset(Arc::clone(&inner));

    tokio::time::sleep(inner.quiet_period).await;

    let committer = inner.committer.clone();
    let commit_id = id.clone();
    let joined = tokio::task::spawn_blocking(move || committer.commit(&commit_id)).await;

    // Reopen the gate before publishing the outcome, so observers of a
    // completion event always see the trigger back in idle.
    drop(reset);

    let event = match joined {
        Ok(Ok(report)) => {
            info!(
                id = %id,
                files = report.files,
                archive = %report.archive.display(),
                "backup committed"
            );
            CycleEvent::Committed {
                id,
                archive: report.archive,
                files: report.files,
            }
        }
        Ok(Err(err)) => {
            let err = anyhow::Error::new(err);
            error!(id = %id, "backup commit failed: {err:#}");
            CycleEvent::Failed {
                id,
                error: format!("{err:#}"),
            }
        }
        Err(join_err) => {
            error!(id = %id, "backup worker panicked: {join_err}");
            CycleEvent::Failed {
                id,
                error: join_err.to_string(),
            }
        }
    };
    let _ = inner.events.send(event);
}
