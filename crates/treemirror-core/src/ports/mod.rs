//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the sync engine depends on, but whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalFileSystem`] - Tree inspection and mutation
//! - [`ISyncLog`] - Destination for per-mutation log events

pub mod local_filesystem;
pub mod sync_log;

pub use local_filesystem::{EntryKind, FileSystemState, ILocalFileSystem};
pub use sync_log::ISyncLog;
