//! Recursive tree copy into a staging directory
//!
//! Walks the source tree and joins each entry's relative path against the
//! destination root. Destination files are overwritten unconditionally;
//! the copy is last-write-wins with no conflict detection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("failed to walk source tree")]
    Walk(#[from] walkdir::Error),
    #[error("path {path} is outside the source tree")]
    OutsideSource { path: PathBuf },
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {path}")]
    CopyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Totals for one completed copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
}

/// Copy every file and directory under `source` into `dest`, preserving
/// relative paths. Symlinks are not followed and not reproduced.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<CopyStats, CopyError> {
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| CopyError::OutsideSource {
                path: entry.path().to_path_buf(),
            })?;

        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|source| CopyError::CreateDir {
                path: target.clone(),
                source,
            })?;
        } else if file_type.is_file() {
            // Parent may not exist yet if the walker surfaced the file
            // before its directory (rename races).
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| CopyError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let bytes = fs::copy(entry.path(), &target).map_err(|source| CopyError::CopyFile {
                path: entry.path().to_path_buf(),
                source,
            })?;
            stats.files += 1;
            stats.bytes += bytes;
        }
    }

    Ok(stats)
}
