//! File enumerator: walks a directory tree, producing candidate file paths.
//!
//! # Strategy
//!
//! The enumerator first attempts a single bulk recursive listing of the
//! root. If that listing fails with a permission error, it falls back to a
//! resilient manual walk that lists one directory at a time and recurses
//! into each subdirectory independently, so one inaccessible subtree never
//! aborts its siblings. Any other failure of the bulk listing is logged and
//! treated as "no files found" for that root; the caller distinguishes a
//! truly empty directory from a failed one only through the log.
//!
//! Cancellation is checked at every file and directory boundary. A
//! cancelled enumerator stops emitting, but completion still propagates
//! downstream because the caller drops the queue sender when `run` returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use walkdir::WalkDir;

use super::ScanError;

/// Directory walker feeding the size-bucket stage.
///
/// One enumerator is created per scan and is not restartable once
/// exhausted; a new scan creates a new enumerator.
#[derive(Debug)]
pub struct Enumerator {
    /// Root path to walk
    root: PathBuf,
    /// Shared cancellation flag, observed at each boundary
    cancel: Arc<AtomicBool>,
}

impl Enumerator {
    /// Create a new enumerator for the given root.
    #[must_use]
    pub fn new(root: &Path, cancel: Arc<AtomicBool>) -> Self {
        Self {
            root: root.to_path_buf(),
            cancel,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Walk the tree, sending every regular-file path into `tx`.
    ///
    /// `files_seen`, when provided, is incremented once per emitted path.
    /// Per-entry failures are logged and skipped; this method never
    /// returns an error. Completion is signalled by the caller dropping
    /// the sender after this returns.
    pub fn run(&self, tx: &Sender<PathBuf>, files_seen: Option<&AtomicU64>) {
        match self.bulk_listing() {
            Ok(paths) => {
                log::debug!(
                    "Bulk listing of {} found {} files",
                    self.root.display(),
                    paths.len()
                );
                for path in paths {
                    if self.is_cancelled() {
                        log::debug!("Enumerator: cancellation observed, stopping emission");
                        return;
                    }
                    if !emit(tx, path, files_seen) {
                        return;
                    }
                }
            }
            Err(ScanError::PermissionDenied(path)) => {
                log::warn!(
                    "Bulk listing denied at {}; falling back to per-directory walk",
                    path.display()
                );
                self.resilient_walk(&self.root, tx, files_seen);
            }
            Err(e) => {
                // Root is fundamentally unusable: log and emit nothing.
                log::warn!("Unable to list {}: {}", self.root.display(), e);
            }
        }
    }

    /// Attempt a single recursive listing of the whole tree, aborting on
    /// the first error so the caller can decide the fallback strategy.
    fn bulk_listing(&self) -> Result<Vec<PathBuf>, ScanError> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root) {
            if self.is_cancelled() {
                return Ok(paths);
            }

            let entry = entry.map_err(classify_walk_error)?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }

        Ok(paths)
    }

    /// Manual recursive walk used when the bulk listing hits a permission
    /// error. Failures are isolated per directory: an unreadable directory
    /// contributes no files but does not stop its siblings.
    fn resilient_walk(&self, dir: &Path, tx: &Sender<PathBuf>, files_seen: Option<&AtomicU64>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut subdirs = Vec::new();

        for entry in entries {
            if self.is_cancelled() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => {
                    if !emit(tx, entry.path(), files_seen) {
                        return;
                    }
                }
                Ok(file_type) if file_type.is_dir() => subdirs.push(entry.path()),
                Ok(_) => {} // symlinks and other special entries are skipped
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                }
            }
        }

        for subdir in subdirs {
            if self.is_cancelled() {
                return;
            }
            self.resilient_walk(&subdir, tx, files_seen);
        }
    }
}

/// Send one path downstream, counting it as seen. Returns `false` if the
/// receiving side is gone (the scan is being torn down).
fn emit(tx: &Sender<PathBuf>, path: PathBuf, files_seen: Option<&AtomicU64>) -> bool {
    if let Some(counter) = files_seen {
        counter.fetch_add(1, Ordering::Relaxed);
    }
    if tx.send(path).is_err() {
        log::debug!("Enumerator: downstream queue closed, stopping");
        return false;
    }
    true
}

fn classify_walk_error(error: walkdir::Error) -> ScanError {
    let path = error
        .path()
        .map_or_else(PathBuf::new, Path::to_path_buf);

    match error.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        },
    }
}
