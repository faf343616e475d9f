//! Change detector
//!
//! Decides whether two regular files have identical content. Sizes are
//! compared first from metadata; only files of equal length are hashed.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;
use treemirror_core::ports::local_filesystem::ILocalFileSystem;

use crate::SyncError;

/// Compares files by (length, SHA-256 digest)
pub struct ChangeDetector {
    fs: Arc<dyn ILocalFileSystem>,
}

impl ChangeDetector {
    pub fn new(fs: Arc<dyn ILocalFileSystem>) -> Self {
        Self { fs }
    }

    /// Returns true iff both files have the same length and digest
    ///
    /// # Errors
    /// Fails with [`SyncError::NotARegularFile`] if either path is not an
    /// existing regular file, and with the underlying I/O error if either
    /// file cannot be read. An unreadable file is never reported as
    /// "different".
    pub fn files_equal(&self, a: &Path, b: &Path) -> Result<bool> {
        let state_a = self.fs.get_state(a)?;
        if !state_a.is_regular_file() {
            return Err(SyncError::NotARegularFile(a.to_path_buf()).into());
        }
        let state_b = self.fs.get_state(b)?;
        if !state_b.is_regular_file() {
            return Err(SyncError::NotARegularFile(b.to_path_buf()).into());
        }

        if state_a.size != state_b.size {
            trace!(
                a = %a.display(),
                b = %b.display(),
                size_a = state_a.size,
                size_b = state_b.size,
                "sizes differ"
            );
            return Ok(false);
        }

        let digest_a = self.fs.compute_hash(a)?;
        let digest_b = self.fs.compute_hash(b)?;
        Ok(digest_a == digest_b)
    }
}
