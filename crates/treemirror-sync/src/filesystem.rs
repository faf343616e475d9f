//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using blocking `std::fs` calls.
//!
//! ## Design Decisions
//!
//! - **Streamed hashing**: files are fed to SHA-256 through a fixed buffer,
//!   so hashing a large file never loads it whole into memory.
//! - **Copy metadata**: `std::fs::copy` carries permission bits; access and
//!   modification times are applied afterwards with `filetime`. Failing to
//!   set times is logged and otherwise ignored.
//! - **Missing paths**: `get_state` maps `NotFound` to
//!   [`FileSystemState::not_found`]; `delete_file` maps it to
//!   [`SyncError::PathNotFound`].

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};
use treemirror_core::{
    domain::newtypes::ContentDigest,
    ports::local_filesystem::{EntryKind, FileSystemState, ILocalFileSystem},
};

use crate::SyncError;

/// Read buffer used while hashing
const HASH_BUFFER_SIZE: usize = 64 * 1024;

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. The roots live in the synchronizer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Best-effort copy of access/modification times from `metadata` onto `to`
fn copy_times(metadata: &fs::Metadata, to: &Path) {
    let accessed = FileTime::from_last_access_time(metadata);
    let modified = FileTime::from_last_modification_time(metadata);
    if let Err(e) = filetime::set_file_times(to, accessed, modified) {
        warn!(path = %to.display(), error = %e, "failed to preserve timestamps");
    }
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    fn list_dir(&self, dir: &Path) -> anyhow::Result<Vec<OsString>> {
        let names = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list entry in: {}", dir.display()))?;
        debug!(entries = names.len(), "directory listed");
        Ok(names)
    }

    fn get_state(&self, path: &Path) -> anyhow::Result<FileSystemState> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(FileSystemState::not_found());
            }
            Err(e) => {
                return Err(SyncError::from(e))
                    .with_context(|| format!("Failed to stat: {}", path.display()));
            }
        };

        let kind = if metadata.is_file() {
            EntryKind::File
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };

        let size = if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        };

        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(FileSystemState {
            exists: true,
            kind,
            size,
            modified,
        })
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn compute_hash(&self, path: &Path) -> anyhow::Result<ContentDigest> {
        let mut file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; HASH_BUFFER_SIZE];
        let mut total: u64 = 0;
        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SyncError::from(e))
                        .with_context(|| format!("Failed to read: {}", path.display()));
                }
            };
            hasher.update(&buf[..n]);
            total += n as u64;
        }

        let digest = ContentDigest::from_slice(hasher.finalize().as_slice())?;
        debug!(bytes = total, %digest, "hash computed");
        Ok(digest)
    }

    #[instrument(skip(self), fields(from = %from.display(), to = %to.display()))]
    fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        let bytes = match fs::copy(from, to) {
            Ok(bytes) => bytes,
            // A read-only replica file (copied from a read-only source) cannot
            // be opened for writing; replace it instead.
            Err(e) if e.kind() == ErrorKind::PermissionDenied && to.is_file() => {
                debug!("destination is read-only, replacing it");
                fs::remove_file(to)
                    .and_then(|()| fs::copy(from, to))
                    .with_context(|| {
                        format!("Failed to replace {} with {}", to.display(), from.display())
                    })?
            }
            Err(e) => {
                return Err(SyncError::from(e)).with_context(|| {
                    format!("Failed to copy {} to {}", from.display(), to.display())
                });
            }
        };

        match fs::metadata(from) {
            Ok(metadata) => copy_times(&metadata, to),
            Err(e) => warn!(error = %e, "source vanished before timestamps could be copied"),
        }

        debug!(bytes, "copy complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_empty_file(&self, path: &Path) -> anyhow::Result<()> {
        File::create(path)
            .with_context(|| format!("Failed to create empty file: {}", path.display()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn delete_file(&self, path: &Path) -> anyhow::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SyncError::PathNotFound(path.to_path_buf()).into())
            }
            Err(e) => Err(SyncError::from(e))
                .with_context(|| format!("Failed to delete file: {}", path.display())),
        }
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn delete_directory(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to delete directory: {}", path.display()))?;
        debug!("directory removed recursively");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn create_directory(&self, path: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
