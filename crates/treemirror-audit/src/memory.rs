//! In-memory sync log

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use treemirror_core::{
    domain::{SyncAction, SyncEvent},
    ports::sync_log::ISyncLog,
};

/// Records every event in order, in memory.
#[derive(Debug, Default)]
pub struct MemorySyncLog {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemorySyncLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SyncEvent>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<SyncEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of recorded events with the given action
    pub fn count(&self, action: SyncAction) -> usize {
        self.lock().iter().filter(|e| e.action() == action).count()
    }

    /// Recorded events as log lines
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }
}

impl ISyncLog for MemorySyncLog {
    fn record(&self, action: SyncAction, path: &Path) {
        self.lock().push(SyncEvent::new(action, path));
    }
}
