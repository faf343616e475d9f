//! Newtype wrappers for type-safe domain values
//!
//! - [`ContentDigest`] - SHA-256 of a file's full content
//! - [`SyncRoots`] - a validated (source, replica) directory pair

use std::fmt;
use std::path::{Path, PathBuf};

use super::errors::DomainError;

// ============================================================================
// ContentDigest
// ============================================================================

/// SHA-256 digest of a file's byte stream
///
/// Two files with equal length and equal digest are treated as identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Length of the digest in bytes
    pub const LEN: usize = 32;

    /// Build a digest from a slice produced by a hasher
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDigest` if the slice is not 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            DomainError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({self})")
    }
}

// ============================================================================
// SyncRoots
// ============================================================================

/// The source and replica roots of a mirror, checked once at startup
///
/// Construction stats both paths: each must exist and be a directory, and
/// neither may contain the other. Violations are structural errors and are
/// meant to be fatal before any pass runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoots {
    source: PathBuf,
    replica: PathBuf,
}

impl SyncRoots {
    /// Validate and pair the two roots
    ///
    /// # Errors
    /// - `InvalidPath` if either path is empty
    /// - `RootNotFound` if either path does not exist
    /// - `NotADirectory` if either path is not a directory
    /// - `OverlappingRoots` if the roots are equal or nested
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let source = source.into();
        let replica = replica.into();

        let canonical_source = Self::check_dir(&source)?;
        let canonical_replica = Self::check_dir(&replica)?;

        if canonical_source.starts_with(&canonical_replica)
            || canonical_replica.starts_with(&canonical_source)
        {
            return Err(DomainError::OverlappingRoots {
                source_root: source.display().to_string(),
                replica_root: replica.display().to_string(),
            });
        }

        Ok(Self { source, replica })
    }

    /// Returns the canonical form of `path` if it is an existing directory
    fn check_dir(path: &Path) -> Result<PathBuf, DomainError> {
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath("path cannot be empty".to_string()));
        }

        let canonical = path
            .canonicalize()
            .map_err(|_| DomainError::RootNotFound(path.display().to_string()))?;

        if !canonical.is_dir() {
            return Err(DomainError::NotADirectory(path.display().to_string()));
        }

        Ok(canonical)
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn replica(&self) -> &Path {
        &self.replica
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_digest_display_is_lowercase_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let digest = ContentDigest::from_slice(&bytes).unwrap();
        let hex = digest.to_string();

        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab00"));
        assert!(hex.ends_with("01"));
    }

    #[test]
    fn test_digest_from_slice_rejects_wrong_length() {
        assert!(ContentDigest::from_slice(&[0u8; 16]).is_err());
        assert!(ContentDigest::from_slice(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_roots_accept_sibling_directories() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let rep = dir.path().join("rep");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(&rep).unwrap();

        let roots = SyncRoots::new(&src, &rep).unwrap();
        assert_eq!(roots.source(), src.as_path());
        assert_eq!(roots.replica(), rep.as_path());
    }

    #[test]
    fn test_roots_reject_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = SyncRoots::new(dir.path().join("nope"), dir.path()).unwrap_err();
        assert!(matches!(err, DomainError::RootNotFound(_)));
    }

    #[test]
    fn test_roots_reject_file_as_replica() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let file = dir.path().join("file.txt");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(&file, b"x").unwrap();

        let err = SyncRoots::new(&src, &file).unwrap_err();
        assert!(matches!(err, DomainError::NotADirectory(_)));
    }

    #[test]
    fn test_roots_reject_nested_replica() {
        let dir = TempDir::new().unwrap();
        let rep = dir.path().join("backup");
        std::fs::create_dir(&rep).unwrap();

        let err = SyncRoots::new(dir.path(), &rep).unwrap_err();
        assert!(matches!(err, DomainError::OverlappingRoots { .. }));
    }

    #[test]
    fn test_roots_reject_identical_paths() {
        let dir = TempDir::new().unwrap();
        let err = SyncRoots::new(dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err, DomainError::OverlappingRoots { .. }));
    }

    #[test]
    fn test_roots_reject_empty_path() {
        let dir = TempDir::new().unwrap();
        let err = SyncRoots::new("", dir.path()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPath(_)));
    }
}
