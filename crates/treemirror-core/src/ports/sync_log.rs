//! Action log port
//!
//! The synchronizer reports every mutation through [`ISyncLog`]. It does not
//! depend on where the events end up: the production sink writes them to
//! stdout and an append-only file, tests collect them in memory.

use std::path::Path;
use std::sync::Arc;

use crate::domain::action::SyncAction;

/// Sink for sync events
///
/// `record` is infallible from the caller's point of view. Implementations
/// that can fail must surface the failure themselves (for example with a
/// `tracing::warn!`) rather than abort the pass.
pub trait ISyncLog: Send + Sync {
    /// Records one mutation applied to `path` in the replica
    fn record(&self, action: SyncAction, path: &Path);
}

impl<T: ISyncLog + ?Sized> ISyncLog for Arc<T> {
    fn record(&self, action: SyncAction, path: &Path) {
        (**self).record(action, path);
    }
}
