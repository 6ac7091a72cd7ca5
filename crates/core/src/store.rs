//! Backup store layout
//!
//! The store is a single directory holding, per completed cycle `S`:
//! ```text
//! <store>/
//!   S.jpg    screenshot captured when the cycle armed (may be absent)
//!   S.zip    deflate archive of the watched tree
//!   S/       staging directory, only present while a commit is running
//! ```

use crate::snapshot::SnapshotId;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Destination directory for archives and screenshots.
///
/// The watched tree is never touched through this type; the store is the
/// only directory the pipeline writes to. Exclusive access during a
/// commit is guaranteed upstream by the trigger's single-flight gate, so
/// no lock is held here.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Open the store at `path`, creating the directory if it is missing
    /// and resolving it to an absolute path.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create backup store {}", path.display()))?;
        let root = path
            .canonicalize()
            .with_context(|| format!("failed to resolve backup store {}", path.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging directory for a cycle: `<store>/<id>/`.
    pub fn staging_path(&self, id: &SnapshotId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Final archive for a cycle: `<store>/<id>.zip`.
    pub fn archive_path(&self, id: &SnapshotId) -> PathBuf {
        self.root.join(format!("{id}.zip"))
    }

    /// Screenshot for a cycle: `<store>/<id>.jpg`.
    pub fn screenshot_path(&self, id: &SnapshotId) -> PathBuf {
        self.root.join(format!("{id}.jpg"))
    }
}
