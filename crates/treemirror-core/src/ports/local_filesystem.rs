//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface the synchronizer uses to inspect and
//! mutate the source and replica trees.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - The trait is synchronous: a pass is a sequence of blocking calls and
//!   the scheduler runs it on a blocking thread.
//! - `get_state` never fails for a missing path; it returns
//!   [`FileSystemState::not_found`] instead so callers can branch on it.

use std::ffi::OsString;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::newtypes::ContentDigest;

// ============================================================================
// EntryKind
// ============================================================================

/// Type of a directory entry as seen by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file
    File,
    /// A directory
    Directory,
    /// Anything else (socket, FIFO, device); never mirrored
    Other,
}

// ============================================================================
// FileSystemState
// ============================================================================

/// Snapshot of a path's state on the local filesystem
///
/// Symbolic links are followed, so a link to a regular file reports
/// [`EntryKind::File`] and a dangling link reports "not found".
#[derive(Debug, Clone)]
pub struct FileSystemState {
    /// Whether anything exists at the path
    pub exists: bool,
    /// Entry type (meaningless when `exists` is false)
    pub kind: EntryKind,
    /// Size in bytes (0 for directories or non-existent paths)
    pub size: u64,
    /// Last modification time (None if not available or path doesn't exist)
    pub modified: Option<DateTime<Utc>>,
}

impl FileSystemState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            exists: false,
            kind: EntryKind::Other,
            size: 0,
            modified: None,
        }
    }

    /// Returns true if the path exists and is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.kind == EntryKind::File
    }

    /// Returns true if the path exists and is a directory
    pub fn is_directory(&self) -> bool {
        self.exists && self.kind == EntryKind::Directory
    }
}

// ============================================================================
// ILocalFileSystem trait
// ============================================================================

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - `list_dir` returns immediate child names only, in no particular order.
/// - `compute_hash` must read the whole file; callers compare sizes first.
/// - `copy_file` replaces any existing file at the destination.
/// - `create_directory` behaves like `mkdir -p`.
pub trait ILocalFileSystem: Send + Sync {
    /// Lists the names of the immediate children of a directory
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    fn list_dir(&self, dir: &Path) -> anyhow::Result<Vec<OsString>>;

    /// Gets the current state of a file or directory
    ///
    /// Returns `FileSystemState::not_found()` if the path doesn't exist
    /// (does not return an error for missing paths).
    fn get_state(&self, path: &Path) -> anyhow::Result<FileSystemState>;

    /// Computes the content digest of a file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be read
    fn compute_hash(&self, path: &Path) -> anyhow::Result<ContentDigest>;

    /// Copies a file's content and, best-effort, its permissions and timestamps
    ///
    /// If the destination exists, its contents are replaced.
    fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()>;

    /// Creates an empty file, truncating any existing file at the path
    fn create_empty_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Deletes a single file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be deleted
    fn delete_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Deletes a directory and everything beneath it
    fn delete_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Creates a directory and all parent directories as needed
    fn create_directory(&self, path: &Path) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_state() {
        let state = FileSystemState::not_found();
        assert!(!state.exists);
        assert!(!state.is_regular_file());
        assert!(!state.is_directory());
        assert_eq!(state.size, 0);
        assert!(state.modified.is_none());
    }

    #[test]
    fn test_kind_predicates() {
        let file = FileSystemState {
            exists: true,
            kind: EntryKind::File,
            size: 3,
            modified: None,
        };
        assert!(file.is_regular_file());
        assert!(!file.is_directory());

        let other = FileSystemState {
            kind: EntryKind::Other,
            ..file
        };
        assert!(!other.is_regular_file());
        assert!(!other.is_directory());
    }
}
