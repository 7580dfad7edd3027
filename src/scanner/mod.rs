//! Scanner module: file discovery and content digesting.
//!
//! This module provides the front half of the duplicate-detection pipeline:
//! - [`enumerator`]: directory traversal producing candidate file paths
//! - [`digest`]: the pluggable content digest boundary (MD5 by default)
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::scanner::Enumerator;
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! let cancel = Arc::new(AtomicBool::new(false));
//! let (tx, rx) = crossbeam_channel::unbounded();
//! Enumerator::new(Path::new("/mnt/usb"), cancel).run(&tx, None);
//! drop(tx);
//! let found: Vec<_> = rx.iter().collect();
//! println!("{} files", found.len());
//! ```

pub mod digest;
pub mod enumerator;

use std::path::PathBuf;

pub use digest::{digest_to_hex, hex_to_digest, Digest, Digester, Md5Digester, DIGEST_LEN};
pub use enumerator::Enumerator;

/// A file observed by the pipeline, with the size it had at stat time.
///
/// Materialized by the size-bucket stage once a path's metadata has been
/// read successfully; discarded after insertion into its size bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileCandidate {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Errors that can occur while enumerating a directory tree.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when listing a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The root path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while listing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while digesting file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found (deleted mid-scan).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error encountered while reading `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_candidate_new() {
        let candidate = FileCandidate::new(PathBuf::from("/test/file.txt"), 1024);
        assert_eq!(candidate.path, PathBuf::from("/test/file.txt"));
        assert_eq!(candidate.size, 1024);
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_hash_error_from_io() {
        let err = HashError::from_io(
            PathBuf::from("/gone"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, HashError::NotFound(_)));

        let err = HashError::from_io(
            PathBuf::from("/secret"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, HashError::PermissionDenied(_)));

        let err = HashError::from_io(
            PathBuf::from("/odd"),
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"),
        );
        assert!(matches!(err, HashError::Io { .. }));
    }

    #[test]
    fn test_hash_error_display() {
        let err = HashError::NotFound(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "File not found: /test");

        let err = HashError::PermissionDenied(PathBuf::from("/secret"));
        assert_eq!(err.to_string(), "Permission denied: /secret");
    }
}
