//! Domain entities
//!
//! This module contains the core domain types for treemirror:
//! - Sync actions and the log events built from them
//! - Newtypes for content digests and validated root pairs
//! - Domain-specific error types

pub mod action;
pub mod errors;
pub mod newtypes;

// Re-export commonly used types
pub use action::{SyncAction, SyncEvent};
pub use errors::DomainError;
pub use newtypes::{ContentDigest, SyncRoots};
