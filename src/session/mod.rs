//! Scan session lifecycle and the pipeline controller.
//!
//! # Overview
//!
//! A [`ScanSession`] owns everything one scan mutates: the size-bucket
//! table, the duplicate index, the cancellation flag, the elapsed-time
//! clock and the seen/hashed counters. Sessions move through
//! `Scanning → (Completed | Cancelled)` and are never reused; a new scan
//! allocates a fresh session so stale workers can never write into the new
//! one's tables.
//!
//! [`Scanner`] is the coordinator that enforces the single-running-session
//! rule: starting a scan first cancels the previous session and waits for
//! every one of its workers to exit before the new session is spawned.
//!
//! Consumers never touch the stage queues. They poll a [`ScanHandle`] for
//! the progress record and a [`DuplicateFeed`](crate::duplicates::DuplicateFeed)
//! for newly qualified groups.
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::session::Scanner;
//! use std::path::Path;
//!
//! let mut scanner = Scanner::with_defaults();
//! let handle = scanner.start(Path::new("/mnt/usb"));
//! let mut feed = handle.feed();
//!
//! while !handle.state().is_terminal() {
//!     for row in feed.poll_new() {
//!         println!("{}  {}", row.digest, row.primary.display());
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! ```

mod pipeline;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::duplicates::{DuplicateFeed, DuplicateIndex, SizeBuckets};
use crate::scanner::{Digester, Md5Digester};

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanState {
    /// Pipeline stages are running.
    Scanning = 0,
    /// Every stage drained its input and exited normally.
    Completed = 1,
    /// The session was cancelled before completing.
    Cancelled = 2,
}

impl ScanState {
    /// Whether the session has reached a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, ScanState::Scanning)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ScanState::Completed,
            2 => ScanState::Cancelled,
            _ => ScanState::Scanning,
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Scanning => write!(f, "scanning"),
            ScanState::Completed => write!(f, "completed"),
            ScanState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Worker counts and batching for one scan.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of size-filter workers consuming the enumerator queue.
    pub filter_workers: usize,
    /// Number of hash workers consuming the candidate queue.
    pub hash_workers: usize,
    /// Maximum number of paths gathered into one digest batch.
    pub batch_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map_or(4, |n| n.get());
        Self {
            filter_workers: (parallelism / 2).max(1),
            hash_workers: parallelism.max(1),
            batch_size: 16,
        }
    }
}

impl SessionConfig {
    /// Set the number of size-filter workers (minimum 1).
    #[must_use]
    pub fn with_filter_workers(mut self, workers: usize) -> Self {
        self.filter_workers = workers.max(1);
        self
    }

    /// Set the number of hash workers (minimum 1).
    #[must_use]
    pub fn with_hash_workers(mut self, workers: usize) -> Self {
        self.hash_workers = workers.max(1);
        self
    }

    /// Set the digest batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Point-in-time progress record for consumers.
///
/// Computed on demand from session counters and the index; reading it
/// never blocks a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Current lifecycle state
    pub state: ScanState,
    /// Time since the scan started; frozen once the session is terminal
    pub elapsed: Duration,
    /// Files emitted by the enumerator so far
    pub files_seen: u64,
    /// Files whose digest was computed and indexed so far
    pub files_hashed: u64,
    /// Groups with at least two members so far
    pub duplicate_groups: usize,
}

/// Shared per-scan state. Every stage holds an `Arc` to the session it was
/// constructed for; there is no ambient or global session reference.
#[derive(Debug)]
pub struct ScanSession {
    root: PathBuf,
    state: AtomicU8,
    cancel: Arc<AtomicBool>,
    buckets: Arc<SizeBuckets>,
    index: Arc<DuplicateIndex>,
    files_seen: AtomicU64,
    files_hashed: AtomicU64,
    started_at: Instant,
    final_elapsed: OnceLock<Duration>,
}

impl ScanSession {
    fn new(root: &Path) -> Arc<Self> {
        Arc::new(Self {
            root: root.to_path_buf(),
            state: AtomicU8::new(ScanState::Scanning as u8),
            cancel: Arc::new(AtomicBool::new(false)),
            buckets: Arc::new(SizeBuckets::new()),
            index: Arc::new(DuplicateIndex::new()),
            files_seen: AtomicU64::new(0),
            files_hashed: AtomicU64::new(0),
            started_at: Instant::now(),
            final_elapsed: OnceLock::new(),
        })
    }

    /// Root directory this session scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        ScanState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether cancellation has been requested (the state flips to
    /// `Cancelled` only once every worker has exited).
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Raise the cooperative cancellation flag. Stages observe it at each
    /// queue take and loop iteration.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Elapsed scan time; stops advancing once the session is terminal.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.final_elapsed
            .get()
            .copied()
            .unwrap_or_else(|| self.started_at.elapsed())
    }

    /// The duplicate index for this session.
    #[must_use]
    pub fn index(&self) -> Arc<DuplicateIndex> {
        Arc::clone(&self.index)
    }

    /// Snapshot the progress record.
    #[must_use]
    pub fn progress(&self) -> ScanProgress {
        ScanProgress {
            state: self.state(),
            elapsed: self.elapsed(),
            files_seen: self.files_seen.load(Ordering::Relaxed),
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            duplicate_groups: self.index.duplicate_group_count(),
        }
    }

    /// Freeze the clock and enter the final state. Called by the watcher
    /// after every worker has exited.
    fn finish(&self) {
        let _ = self.final_elapsed.set(self.started_at.elapsed());
        let final_state = if self.is_cancel_requested() {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        self.state.store(final_state as u8, Ordering::SeqCst);
    }
}

/// Handle to a spawned scan.
///
/// Dropping the handle cancels the scan and waits for its workers, so a
/// superseded session can never keep writing after it is discarded.
#[derive(Debug)]
pub struct ScanHandle {
    session: Arc<ScanSession>,
    watcher: Option<JoinHandle<()>>,
}

impl ScanHandle {
    /// Root directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.session.root()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.session.state()
    }

    /// Snapshot the progress record.
    #[must_use]
    pub fn progress(&self) -> ScanProgress {
        self.session.progress()
    }

    /// The underlying session state.
    #[must_use]
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// The session's duplicate index.
    #[must_use]
    pub fn index(&self) -> Arc<DuplicateIndex> {
        self.session.index()
    }

    /// Create a fresh exactly-once feed over this session's index.
    #[must_use]
    pub fn feed(&self) -> DuplicateFeed {
        DuplicateFeed::new(self.session.index())
    }

    /// Request cancellation without waiting for workers to exit.
    pub fn cancel(&self) {
        self.session.request_cancel();
    }

    /// Block until every stage has exited and return the final state.
    ///
    /// Waits are bounded in practice: every worker polls its queue with a
    /// short timeout and re-checks the cancellation flag each iteration.
    pub fn wait(&mut self) -> ScanState {
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
        self.session.state()
    }

    /// Cancel the scan and wait for acknowledgment (every worker exited).
    pub fn cancel_and_wait(&mut self) -> ScanState {
        self.cancel();
        self.wait()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.session.request_cancel();
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.join();
        }
    }
}

/// Pipeline coordinator: owns the digester and at most one running scan.
pub struct Scanner {
    digester: Arc<dyn Digester>,
    config: SessionConfig,
    current: Option<ScanHandle>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("current", &self.current.as_ref().map(|h| h.state()))
            .finish()
    }
}

impl Scanner {
    /// Create a scanner with the given digester and worker configuration.
    #[must_use]
    pub fn new(digester: Arc<dyn Digester>, config: SessionConfig) -> Self {
        Self {
            digester,
            config,
            current: None,
        }
    }

    /// Create a scanner with the MD5 digester and default worker counts.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(Md5Digester::new()), SessionConfig::default())
    }

    /// Start scanning `root`, superseding any running scan.
    ///
    /// A running session is cancelled first and its workers are joined
    /// before the new session is spawned, so the old scan can never leak
    /// entries into the new session's index.
    pub fn start(&mut self, root: &Path) -> &ScanHandle {
        if let Some(mut previous) = self.current.take() {
            log::info!(
                "Superseding running scan of {}",
                previous.root().display()
            );
            previous.cancel_and_wait();
        }

        let session = ScanSession::new(root);
        log::info!("Starting scan of {}", root.display());
        let handle = pipeline::spawn(session, Arc::clone(&self.digester), &self.config);
        self.current.insert(handle)
    }

    /// The running (or last finished) scan, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ScanHandle> {
        self.current.as_ref()
    }

    /// Mutable access to the current scan (for `wait`).
    pub fn current_mut(&mut self) -> Option<&mut ScanHandle> {
        self.current.as_mut()
    }

    /// Cancel the current scan, if any, and wait for acknowledgment.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.cancel_and_wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) {
        let mut f = File::create(dir.path().join(name)).unwrap();
        f.write_all(contents).unwrap();
    }

    #[test]
    fn test_scan_state_terminal() {
        assert!(!ScanState::Scanning.is_terminal());
        assert!(ScanState::Completed.is_terminal());
        assert!(ScanState::Cancelled.is_terminal());
    }

    #[test]
    fn test_scan_state_display() {
        assert_eq!(ScanState::Scanning.to_string(), "scanning");
        assert_eq!(ScanState::Completed.to_string(), "completed");
        assert_eq!(ScanState::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_session_config_minimums() {
        let config = SessionConfig::default()
            .with_filter_workers(0)
            .with_hash_workers(0)
            .with_batch_size(0);

        assert_eq!(config.filter_workers, 1);
        assert_eq!(config.hash_workers, 1);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_scan_empty_dir_completes() {
        let dir = TempDir::new().unwrap();
        let mut scanner = Scanner::with_defaults();

        let handle = scanner.start(dir.path());
        assert_eq!(handle.root(), dir.path());

        let state = scanner.current_mut().unwrap().wait();
        assert_eq!(state, ScanState::Completed);

        let progress = scanner.current().unwrap().progress();
        assert_eq!(progress.files_seen, 0);
        assert_eq!(progress.duplicate_groups, 0);
    }

    #[test]
    fn test_scan_finds_duplicates_and_counts() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.txt", b"same-bytes");
        write_file(&dir, "b.txt", b"same-bytes");
        write_file(&dir, "c.txt", b"other-size-entirely");

        let mut scanner = Scanner::with_defaults();
        scanner.start(dir.path());
        let state = scanner.current_mut().unwrap().wait();
        assert_eq!(state, ScanState::Completed);

        let progress = scanner.current().unwrap().progress();
        assert_eq!(progress.files_seen, 3);
        assert_eq!(progress.files_hashed, 2, "unique size is never hashed");
        assert_eq!(progress.duplicate_groups, 1);
    }

    #[test]
    fn test_elapsed_freezes_after_completion() {
        let dir = TempDir::new().unwrap();
        let mut scanner = Scanner::with_defaults();
        scanner.start(dir.path());
        scanner.current_mut().unwrap().wait();

        let first = scanner.current().unwrap().progress().elapsed;
        std::thread::sleep(Duration::from_millis(30));
        let second = scanner.current().unwrap().progress().elapsed;

        assert_eq!(first, second, "clock stops with the scan");
    }

    #[test]
    fn test_cancel_before_completion_reports_cancelled() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            write_file(&dir, &format!("f{}.bin", i), b"0123456789");
        }

        // A digester slow enough that cancellation lands mid-scan.
        struct SlowDigester;
        impl Digester for SlowDigester {
            fn digest_file(
                &self,
                _path: &Path,
            ) -> Result<crate::scanner::Digest, crate::scanner::HashError> {
                std::thread::sleep(Duration::from_millis(20));
                Ok([0u8; 16])
            }
        }

        let mut scanner = Scanner::new(
            Arc::new(SlowDigester),
            SessionConfig::default().with_hash_workers(1).with_batch_size(1),
        );
        scanner.start(dir.path());
        std::thread::sleep(Duration::from_millis(50));

        let handle = scanner.current_mut().unwrap();
        handle.cancel();
        let state = handle.wait();
        assert_eq!(state, ScanState::Cancelled);
    }

    #[test]
    fn test_start_supersedes_previous_session() {
        let old_dir = TempDir::new().unwrap();
        write_file(&old_dir, "old1.txt", b"old-content");
        write_file(&old_dir, "old2.txt", b"old-content");

        let new_dir = TempDir::new().unwrap();
        write_file(&new_dir, "new1.txt", b"new-content!");
        write_file(&new_dir, "new2.txt", b"new-content!");

        let mut scanner = Scanner::with_defaults();
        scanner.start(old_dir.path());
        let old_index = scanner.current().unwrap().index();

        scanner.start(new_dir.path());
        let state = scanner.current_mut().unwrap().wait();
        assert_eq!(state, ScanState::Completed);

        let new_index = scanner.current().unwrap().index();
        assert!(
            !Arc::ptr_eq(&old_index, &new_index),
            "new session allocates fresh tables"
        );

        for group in new_index.snapshot_duplicates() {
            for path in &group.paths {
                assert!(
                    path.starts_with(new_dir.path()),
                    "old session leaked {} into the new index",
                    path.display()
                );
            }
        }
    }

    #[test]
    fn test_stop_with_no_scan_is_noop() {
        let mut scanner = Scanner::with_defaults();
        scanner.stop();
        assert!(scanner.current().is_none());
    }
}
