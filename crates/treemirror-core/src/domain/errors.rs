//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mainly the structural checks applied to the source and replica roots
//! before the periodic loop starts.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A configured root does not exist
    #[error("Root not found: {0}")]
    RootNotFound(String),

    /// A configured root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Source and replica roots are the same or nested inside each other
    #[error("Source {source_root} and replica {replica_root} overlap")]
    OverlappingRoots {
        /// The source root
        source_root: String,
        /// The replica root
        replica_root: String,
    },

    /// Invalid digest format (expected lowercase hex SHA-256)
    #[error("Invalid digest format: {0}")]
    InvalidDigest(String),
}
