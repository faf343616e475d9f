//! Sync scheduler - runs synchronization passes at a fixed interval
//!
//! The [`SyncScheduler`] owns everything a pass needs and drives the
//! [`TreeSynchronizer`] from async code. Each pass runs to completion on a
//! blocking thread; the scheduler then sleeps for the configured interval
//! or until shutdown is requested, whichever comes first.
//!
//! ## Flow
//!
//! ```text
//! run() ──→ spawn_blocking(synchronize) ──→ log summary ──→ select! {
//!   ▲                                                         sleep(interval)
//!   └─────────────────────────────────────────────────────────  shutdown.cancelled()
//!                                                           }
//! ```
//!
//! A failed pass is logged and the loop continues. Shutdown is only
//! observed between passes, so a pass is never interrupted midway.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use treemirror_core::{domain::SyncRoots, ports::sync_log::ISyncLog};

use crate::engine::{SyncReport, TreeSynchronizer};

/// Counters returned when the scheduler stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Passes attempted, successful or not
    pub passes: u64,
    /// Passes that ended with an error
    pub failures: u64,
}

/// Periodic driver for [`TreeSynchronizer`]
pub struct SyncScheduler {
    synchronizer: Arc<TreeSynchronizer>,
    roots: Arc<SyncRoots>,
    log: Arc<dyn ISyncLog>,
    interval: Duration,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `synchronizer` - The engine to run each pass
    /// * `roots` - Validated source and replica roots
    /// * `log` - Sink receiving one record per applied action
    /// * `interval` - Pause between the end of one pass and the start of the next
    pub fn new(
        synchronizer: Arc<TreeSynchronizer>,
        roots: SyncRoots,
        log: Arc<dyn ISyncLog>,
        interval: Duration,
    ) -> Self {
        info!(
            source = %roots.source().display(),
            replica = %roots.replica().display(),
            interval_secs = interval.as_secs(),
            "Creating sync scheduler"
        );

        Self {
            synchronizer,
            roots: Arc::new(roots),
            log,
            interval,
        }
    }

    /// Runs a single pass on a blocking thread
    pub async fn run_pass(&self) -> Result<SyncReport> {
        let synchronizer = Arc::clone(&self.synchronizer);
        let roots = Arc::clone(&self.roots);
        let log = Arc::clone(&self.log);

        tokio::task::spawn_blocking(move || synchronizer.synchronize(&roots, log.as_ref()))
            .await
            .context("Sync pass task panicked or was cancelled")?
    }

    /// Main loop: pass, report, wait; until `shutdown` is cancelled
    ///
    /// The first pass starts immediately.
    pub async fn run(&self, shutdown: CancellationToken) -> SchedulerStats {
        info!("Sync scheduler starting");
        let mut stats = SchedulerStats::default();

        while !shutdown.is_cancelled() {
            stats.passes += 1;
            match self.run_pass().await {
                Ok(report) => {
                    info!(
                        pass = stats.passes,
                        created = report.files_created + report.empty_files_created,
                        updated = report.files_updated,
                        dirs_created = report.directories_created,
                        deleted = report.files_deleted + report.directories_deleted,
                        duration_ms = report.duration_ms,
                        dry_run = report.dry_run,
                        "Sync pass complete"
                    );
                }
                Err(e) => {
                    stats.failures += 1;
                    error!(pass = stats.passes, error = %format!("{e:#}"), "Sync pass failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping scheduler");
                }
            }
        }

        info!(passes = stats.passes, failures = stats.failures, "Sync scheduler stopped");
        stats
    }
}

// ============================================================================
// Unit tests
// ============================================================================
