//! Sync actions
//!
//! Every mutation the synchronizer applies to the replica tree is one of the
//! [`SyncAction`] variants. A [`SyncEvent`] pairs an action with the replica
//! path it touched and renders as the action-log line `"<label>: <path>"`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single mutation applied to the replica tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// A file was copied into the replica where none existed
    CreateFile,
    /// A zero-length file was (re)created in the replica
    CreateEmptyFile,
    /// An existing replica file was overwritten with the source content
    UpdateFile,
    /// A directory (and any missing parents) was created in the replica
    CreateDirectory,
    /// A replica file with no source counterpart was removed
    DeleteFile,
    /// A replica subtree with no source counterpart was removed
    DeleteDirectory,
}

impl SyncAction {
    /// All actions, in the order they are reported in summaries
    pub const ALL: [SyncAction; 6] = [
        SyncAction::CreateFile,
        SyncAction::CreateEmptyFile,
        SyncAction::UpdateFile,
        SyncAction::CreateDirectory,
        SyncAction::DeleteFile,
        SyncAction::DeleteDirectory,
    ];

    /// Human-readable label written at the start of each log line
    pub fn label(&self) -> &'static str {
        match self {
            SyncAction::CreateFile => "Created",
            SyncAction::CreateEmptyFile => "Created empty file",
            SyncAction::UpdateFile => "Updated",
            SyncAction::CreateDirectory => "Created directory",
            SyncAction::DeleteFile => "Deleted",
            SyncAction::DeleteDirectory => "Deleted directory",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An action paired with the replica path it was applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    action: SyncAction,
    path: PathBuf,
}

impl SyncEvent {
    pub fn new(action: SyncAction, path: impl Into<PathBuf>) -> Self {
        Self {
            action,
            path: path.into(),
        }
    }

    pub fn action(&self) -> SyncAction {
        self.action
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_labels() {
        assert_eq!(SyncAction::CreateFile.to_string(), "Created");
        assert_eq!(SyncAction::CreateEmptyFile.to_string(), "Created empty file");
        assert_eq!(SyncAction::UpdateFile.to_string(), "Updated");
        assert_eq!(SyncAction::CreateDirectory.to_string(), "Created directory");
        assert_eq!(SyncAction::DeleteFile.to_string(), "Deleted");
        assert_eq!(SyncAction::DeleteDirectory.to_string(), "Deleted directory");
    }

    #[test]
    fn test_event_display_is_log_line() {
        let event = SyncEvent::new(SyncAction::UpdateFile, "/replica/docs/f.txt");
        assert_eq!(event.to_string(), "Updated: /replica/docs/f.txt");
        assert_eq!(event.action(), SyncAction::UpdateFile);
        assert_eq!(event.path(), Path::new("/replica/docs/f.txt"));
    }

    #[test]
    fn test_action_serialization() {
        let yaml = serde_yaml::to_string(&SyncAction::CreateEmptyFile).unwrap();
        assert_eq!(yaml.trim(), "create_empty_file");

        let back: SyncAction = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, SyncAction::CreateEmptyFile);
    }
}
