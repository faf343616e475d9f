//! treemirror sync - One-way tree mirroring engine
//!
//! Provides:
//! - Whole-file change detection (size check, then SHA-256)
//! - Two-pass source → replica synchronization
//! - A periodic scheduler that runs passes on a blocking thread
//!
//! ## Modules
//!
//! - [`detector`] - Decides whether two files differ
//! - [`engine`] - Tree synchronizer applying create/update/delete actions
//! - [`filesystem`] - Local filesystem adapter (`std::fs`, streamed hashing)
//! - [`scheduler`] - Fixed-interval pass loop with graceful shutdown

pub mod detector;
pub mod engine;
pub mod filesystem;
pub mod scheduler;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// A file comparison was requested for something that is not a regular file
    #[error("Not a regular file: {0}")]
    NotARegularFile(PathBuf),
}
