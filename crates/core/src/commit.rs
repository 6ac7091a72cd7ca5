//! Backup committer: copy -> archive -> cleanup for one snapshot
//!
//! The steps run strictly in order. On any failure the staging directory
//! and any partial archive are removed before the error is returned, so
//! the store never keeps partial commit state. Serialization of commits
//! is the caller's job (the debounce trigger admits one cycle at a time).

use crate::archive::{self, ArchiveError};
use crate::copy::{self, CopyError};
use crate::snapshot::SnapshotId;
use crate::store::BackupStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to create staging directory {path}")]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy watched tree into staging")]
    Copy(#[from] CopyError),
    #[error("failed to write archive")]
    Archive(#[from] ArchiveError),
    #[error("failed to remove staging directory {path}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of one successful commit.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub id: SnapshotId,
    pub archive: PathBuf,
    pub files: u64,
    pub bytes: u64,
}

/// Materializes snapshots of a watched tree into a backup store.
#[derive(Debug, Clone)]
pub struct BackupCommitter {
    source: PathBuf,
    store: BackupStore,
}

impl BackupCommitter {
    pub fn new(source: impl Into<PathBuf>, store: BackupStore) -> Self {
        Self {
            source: source.into(),
            store,
        }
    }

    pub fn store(&self) -> &BackupStore {
        &self.store
    }

    /// Commit one snapshot: stage a full copy of the watched tree, zip
    /// it, then drop the staging directory.
    pub fn commit(&self, id: &SnapshotId) -> Result<CommitReport, CommitError> {
        let staging = self.store.staging_path(id);
        let archive = self.store.archive_path(id);

        let result = self.run(id, &staging, &archive);
        if result.is_err() {
            // Roll back whatever this cycle managed to write. Best
            // effort: the original error is the one worth surfacing.
            let _ = fs::remove_dir_all(&staging);
            let _ = fs::remove_file(&archive);
        }
        result
    }

    fn run(
        &self,
        id: &SnapshotId,
        staging: &Path,
        archive: &Path,
    ) -> Result<CommitReport, CommitError> {
        fs::create_dir_all(staging).map_err(|source| CommitError::Staging {
            path: staging.to_path_buf(),
            source,
        })?;

        let stats = copy::copy_tree(&self.source, staging)?;
        debug!(id = %id, files = stats.files, bytes = stats.bytes, "staging copy complete");

        archive::write_zip(staging, archive)?;

        fs::remove_dir_all(staging).map_err(|source| CommitError::Cleanup {
            path: staging.to_path_buf(),
            source,
        })?;

        Ok(CommitReport {
            id: id.clone(),
            archive: archive.to_path_buf(),
            files: stats.files,
            bytes: stats.bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, TempDir, BackupCommitter) {
        let source = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let store = BackupStore::open(backups.path()).unwrap();
        let committer = BackupCommitter::new(source.path(), store);
        (source, backups, committer)
    }

    #[test]
    fn successful_commit_leaves_archive_and_no_staging() {
        let (source, _backups, committer) = setup();
        write(&source.path().join("save1.dat"), "slot one");
        write(&source.path().join("meta").join("info.txt"), "metadata");

        let id = SnapshotId::new("2024-01-01 12-00-00");
        let report = committer.commit(&id).unwrap();

        assert_eq!(report.files, 2);
        assert!(report.archive.is_file());
        assert!(!committer.store().staging_path(&id).exists());

        let mut zip = ZipArchive::new(fs::File::open(&report.archive).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("meta/info.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "metadata");
    }

    #[test]
    fn archive_captures_tree_state_at_commit_time() {
        let (source, _backups, committer) = setup();
        write(&source.path().join("save1.dat"), "first write");
        write(&source.path().join("save1.dat"), "final post-burst contents");

        let id = SnapshotId::new("2024-01-01 12-00-00");
        let report = committer.commit(&id).unwrap();

        let mut zip = ZipArchive::new(fs::File::open(&report.archive).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("save1.dat")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "final post-burst contents");
    }

    #[test]
    fn failed_commit_removes_staging_and_partial_archive() {
        let backups = TempDir::new().unwrap();
        let store = BackupStore::open(backups.path()).unwrap();
        let committer = BackupCommitter::new("/nonexistent/savepoint-test", store.clone());

        let id = SnapshotId::new("2024-01-01 12-00-00");
        let err = committer.commit(&id);

        assert!(matches!(err, Err(CommitError::Copy(_))));
        assert!(!store.staging_path(&id).exists());
        assert!(!store.archive_path(&id).exists());
    }

    #[test]
    fn commit_tolerates_leftover_staging_directory() {
        let (source, _backups, committer) = setup();
        write(&source.path().join("save1.dat"), "fresh");

        let id = SnapshotId::new("2024-01-01 12-00-00");
        // Simulate a staging dir abandoned by an interrupted process.
        let staging = committer.store().staging_path(&id);
        write(&staging.join("stale.dat"), "stale");

        let report = committer.commit(&id).unwrap();
        assert!(report.archive.is_file());
        assert!(!staging.exists());
    }

    #[test]
    fn sequential_commits_do_not_interfere() {
        let (source, _backups, committer) = setup();
        write(&source.path().join("save1.dat"), "one");

        let first = committer.commit(&SnapshotId::new("2024-01-01 12-00-00")).unwrap();
        write(&source.path().join("save1.dat"), "two");
        let second = committer.commit(&SnapshotId::new("2024-01-01 12-00-05")).unwrap();

        assert!(first.archive.is_file());
        assert!(second.archive.is_file());
        assert_ne!(first.archive, second.archive);
    }
}
