//! Tree synchronizer
//!
//! The [`TreeSynchronizer`] makes a replica directory tree match a source
//! tree. One call to [`synchronize`](TreeSynchronizer::synchronize) is one
//! pass, made of two sequential walks:
//!
//! 1. **Propagate** (source → replica): create missing directories, copy
//!    missing files, overwrite files whose content differs, and replace
//!    replica entries of the wrong type.
//! 2. **Prune** (replica → source): delete replica entries with no source
//!    counterpart, recursing into directories present on both sides.
//!
//! Every mutation is reported to the caller's [`ISyncLog`] and counted in the
//! returned [`SyncReport`]. Any I/O error aborts the pass; nothing is retried
//! here because the next pass re-derives every decision from the trees.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use treemirror_core::config::SyncConfig;
use treemirror_core::domain::{SyncAction, SyncRoots};
use treemirror_core::ports::local_filesystem::{EntryKind, FileSystemState, ILocalFileSystem};
use treemirror_core::ports::sync_log::ISyncLog;

use crate::detector::ChangeDetector;

// ============================================================================
// SyncReport
// ============================================================================

/// Summary of a completed synchronization pass
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
    /// Whether mutations were only reported, not applied
    pub dry_run: bool,
    pub files_created: u32,
    pub empty_files_created: u32,
    pub files_updated: u32,
    pub directories_created: u32,
    pub files_deleted: u32,
    pub directories_deleted: u32,
}

impl SyncReport {
    fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            duration_ms: 0,
            dry_run,
            files_created: 0,
            empty_files_created: 0,
            files_updated: 0,
            directories_created: 0,
            files_deleted: 0,
            directories_deleted: 0,
        }
    }

    fn counter_mut(&mut self, action: SyncAction) -> &mut u32 {
        match action {
            SyncAction::CreateFile => &mut self.files_created,
            SyncAction::CreateEmptyFile => &mut self.empty_files_created,
            SyncAction::UpdateFile => &mut self.files_updated,
            SyncAction::CreateDirectory => &mut self.directories_created,
            SyncAction::DeleteFile => &mut self.files_deleted,
            SyncAction::DeleteDirectory => &mut self.directories_deleted,
        }
    }

    /// Number of times `action` was applied during the pass
    pub fn count(&self, action: SyncAction) -> u32 {
        match action {
            SyncAction::CreateFile => self.files_created,
            SyncAction::CreateEmptyFile => self.empty_files_created,
            SyncAction::UpdateFile => self.files_updated,
            SyncAction::CreateDirectory => self.directories_created,
            SyncAction::DeleteFile => self.files_deleted,
            SyncAction::DeleteDirectory => self.directories_deleted,
        }
    }

    /// Total number of actions across all kinds
    pub fn total_actions(&self) -> u32 {
        SyncAction::ALL.iter().map(|a| self.count(*a)).sum()
    }

    /// Returns true if the pass changed nothing
    pub fn is_noop(&self) -> bool {
        self.total_actions() == 0
    }
}

// ============================================================================
// Pass state
// ============================================================================

/// Per-pass bookkeeping threaded through the walk
struct Pass<'a> {
    log: &'a dyn ISyncLog,
    report: SyncReport,
    /// Replica paths treated as absent during a dry run because the pass
    /// would have created or removed them
    phantom: Vec<PathBuf>,
}

impl Pass<'_> {
    fn emit(&mut self, action: SyncAction, path: &Path) {
        debug!(action = ?action, path = %path.display(), "sync action");
        *self.report.counter_mut(action) += 1;
        self.log.record(action, path);
    }

    fn is_phantom(&self, path: &Path) -> bool {
        self.phantom.iter().any(|p| path.starts_with(p))
    }
}

// ============================================================================
// TreeSynchronizer
// ============================================================================

/// One-way mirror from a source tree to a replica tree
///
/// The synchronizer is stateless between passes and synchronous: every
/// filesystem call blocks. Run it on a blocking thread from async code.
pub struct TreeSynchronizer {
    /// Local filesystem operations
    fs: Arc<dyn ILocalFileSystem>,
    /// Size-then-digest file comparison
    detector: ChangeDetector,
    /// Recreate replica files for zero-length sources even when already empty
    recreate_empty_files: bool,
    /// Report actions without applying them
    dry_run: bool,
}

impl TreeSynchronizer {
    /// Creates a new `TreeSynchronizer`
    ///
    /// # Arguments
    /// * `fs` - Filesystem port used for both trees
    /// * `config` - Sync settings (only `recreate_empty_files` is read here)
    pub fn new(fs: Arc<dyn ILocalFileSystem>, config: &SyncConfig) -> Self {
        let detector = ChangeDetector::new(Arc::clone(&fs));
        Self {
            fs,
            detector,
            recreate_empty_files: config.recreate_empty_files,
            dry_run: false,
        }
    }

    /// Enables or disables dry-run mode.
    ///
    /// In dry-run mode every decision is made and every event is emitted as
    /// in a real pass, but the replica is never modified.
    pub fn set_dry_run(&mut self, enabled: bool) {
        if enabled != self.dry_run {
            info!(enabled, "Dry-run mode changed");
        }
        self.dry_run = enabled;
    }

    /// Returns whether the synchronizer is in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // ========================================================================
    // synchronize()
    // ========================================================================

    /// Performs one full pass: propagate, then prune
    ///
    /// # Returns
    /// A [`SyncReport`] counting the actions applied
    ///
    /// # Errors
    /// Returns the first I/O error encountered; the replica is left in
    /// whatever state the pass had reached.
    #[tracing::instrument(skip(self, roots, log), fields(source = %roots.source().display(), replica = %roots.replica().display()))]
    pub fn synchronize(&self, roots: &SyncRoots, log: &dyn ISyncLog) -> Result<SyncReport> {
        let start = Instant::now();
        let mut pass = Pass {
            log,
            report: SyncReport::new(self.dry_run),
            phantom: Vec::new(),
        };

        self.propagate(roots.source(), roots.replica(), &mut pass)
            .context("Source to replica pass failed")?;
        self.prune(roots.source(), roots.replica(), &mut pass)
            .context("Replica cleanup pass failed")?;

        let mut report = pass.report;
        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    // ========================================================================
    // Pass 1: source -> replica
    // ========================================================================

    fn propagate(&self, source_dir: &Path, replica_dir: &Path, pass: &mut Pass<'_>) -> Result<()> {
        for name in self.fs.list_dir(source_dir)? {
            let source_path = source_dir.join(&name);
            let replica_path = replica_dir.join(&name);
            let source_state = self.fs.get_state(&source_path)?;

            if !source_state.exists {
                debug!(path = %source_path.display(), "Source entry vanished during scan");
                continue;
            }

            match source_state.kind {
                EntryKind::Directory => {
                    self.propagate_directory(&replica_path, pass)?;
                    self.propagate(&source_path, &replica_path, pass)?;
                }
                EntryKind::File => {
                    self.propagate_file(&source_path, &source_state, &replica_path, pass)?;
                }
                EntryKind::Other => {
                    debug!(path = %source_path.display(), "Skipping special file");
                }
            }
        }
        Ok(())
    }

    /// Ensures a directory exists at `replica_path`
    fn propagate_directory(&self, replica_path: &Path, pass: &mut Pass<'_>) -> Result<()> {
        let replica_state = self.replica_state(replica_path, pass)?;
        if replica_state.is_directory() {
            return Ok(());
        }

        self.remove_mismatched(replica_path, &replica_state, pass)?;

        if !self.dry_run {
            self.fs.create_directory(replica_path)?;
        } else {
            pass.phantom.push(replica_path.to_path_buf());
        }
        pass.emit(SyncAction::CreateDirectory, replica_path);
        Ok(())
    }

    /// Ensures `replica_path` is a file with the same content as `source_path`
    fn propagate_file(
        &self,
        source_path: &Path,
        source_state: &FileSystemState,
        replica_path: &Path,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        let replica_state = self.replica_state(replica_path, pass)?;
        let replica_exists = if replica_state.exists && !replica_state.is_regular_file() {
            self.remove_mismatched(replica_path, &replica_state, pass)?;
            false
        } else {
            replica_state.exists
        };

        if source_state.size == 0 {
            if replica_exists && replica_state.size == 0 && !self.recreate_empty_files {
                return Ok(());
            }
            if !self.dry_run {
                if replica_exists {
                    self.fs.delete_file(replica_path)?;
                }
                self.fs.create_empty_file(replica_path)?;
            }
            pass.emit(SyncAction::CreateEmptyFile, replica_path);
            return Ok(());
        }

        if !replica_exists {
            if !self.dry_run {
                self.fs.copy_file(source_path, replica_path)?;
            }
            pass.emit(SyncAction::CreateFile, replica_path);
        } else if !self.detector.files_equal(source_path, replica_path)? {
            if let (Some(src_mtime), Some(rep_mtime)) = (source_state.modified, replica_state.modified) {
                if rep_mtime > src_mtime {
                    warn!(
                        path = %replica_path.display(),
                        source_modified = %src_mtime,
                        replica_modified = %rep_mtime,
                        "Replica file is newer than source, overwriting"
                    );
                }
            }
            if !self.dry_run {
                self.fs.copy_file(source_path, replica_path)?;
            }
            pass.emit(SyncAction::UpdateFile, replica_path);
        }
        Ok(())
    }

    /// Removes a replica entry whose type does not match its source entry
    fn remove_mismatched(
        &self,
        replica_path: &Path,
        replica_state: &FileSystemState,
        pass: &mut Pass<'_>,
    ) -> Result<()> {
        if !replica_state.exists {
            return Ok(());
        }
        debug!(path = %replica_path.display(), kind = ?replica_state.kind, "Replacing mismatched entry");
        self.remove(replica_path, replica_state, pass)?;
        if self.dry_run {
            pass.phantom.push(replica_path.to_path_buf());
        }
        Ok(())
    }

    // ========================================================================
    // Pass 2: replica -> source
    // ========================================================================

    fn prune(&self, source_dir: &Path, replica_dir: &Path, pass: &mut Pass<'_>) -> Result<()> {
        for name in self.fs.list_dir(replica_dir)? {
            let source_path = source_dir.join(&name);
            let replica_path = replica_dir.join(&name);
            let source_state = self.fs.get_state(&source_path)?;
            let replica_state = self.fs.get_state(&replica_path)?;

            if !replica_state.exists {
                debug!(path = %replica_path.display(), "Replica entry not resolvable, skipping");
                continue;
            }

            if !source_state.exists {
                self.remove(&replica_path, &replica_state, pass)?;
            } else if source_state.is_directory() && replica_state.is_directory() {
                self.prune(&source_path, &replica_path, pass)?;
            }
        }
        Ok(())
    }

    /// Deletes a replica entry, emitting one event for the whole entry
    fn remove(&self, replica_path: &Path, replica_state: &FileSystemState, pass: &mut Pass<'_>) -> Result<()> {
        if replica_state.is_directory() {
            if !self.dry_run {
                self.fs.delete_directory(replica_path)?;
            }
            pass.emit(SyncAction::DeleteDirectory, replica_path);
        } else {
            if !self.dry_run {
                self.fs.delete_file(replica_path)?;
            }
            pass.emit(SyncAction::DeleteFile, replica_path);
        }
        Ok(())
    }

    /// Stats a replica path, honouring dry-run phantoms
    fn replica_state(&self, replica_path: &Path, pass: &Pass<'_>) -> Result<FileSystemState> {
        if pass.is_phantom(replica_path) {
            return Ok(FileSystemState::not_found());
        }
        self.fs.get_state(replica_path)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
