//! Zip archival of a staging directory
//!
//! Entries sit at the top level of the archive under their relative
//! paths, matching the staging directory layout exactly. Deflate only;
//! the archive format's own checksums are the only integrity mechanism.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to walk staging tree")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// Create `archive` from the full contents of `staging`.
///
/// Returns the number of file entries written. Directory entries are
/// recorded too so empty directories survive extraction.
pub fn write_zip(staging: &Path, archive: &Path) -> Result<u64, ArchiveError> {
    let file = File::create(archive)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0u64;

    // Deterministic entry order keeps archives of identical trees identical.
    for entry in WalkDir::new(staging).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let rel = match entry.path().strip_prefix(staging) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue, // the staging root itself
        };
        let name = rel
            .iter()
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut reader = File::open(entry.path())?;
            io::copy(&mut reader, &mut zip)?;
            files += 1;
        }
    }

    let mut inner = zip.finish()?;
    inner.flush()?;
    Ok(files)
}
