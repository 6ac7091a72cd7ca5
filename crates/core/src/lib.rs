//! Core backup pipeline for Savepoint
//!
//! This crate provides:
//! - Snapshot naming (wall-clock derived, collision-disambiguated)
//! - Backup store layout (staging dirs, archives, screenshots)
//! - Recursive tree copy with structured relative paths
//! - Zip archival (deflate, entries at the archive top level)
//! - The backup committer: copy -> archive -> cleanup, with rollback

pub mod archive;
pub mod commit;
pub mod copy;
pub mod snapshot;
pub mod store;

// Re-exports
pub use archive::ArchiveError;
pub use commit::{BackupCommitter, CommitError, CommitReport};
pub use copy::{CopyError, CopyStats};
pub use snapshot::{SnapshotId, SnapshotNamer};
pub use store::BackupStore;
