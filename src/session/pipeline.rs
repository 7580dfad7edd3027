//! Stage wiring for one scan session.
//!
//! One enumerator thread feeds N size-filter workers over an unbounded
//! queue of paths; the filters feed M hash workers over a second queue.
//! Completion propagates by sender disconnection: the enumerator drops its
//! sender when it returns, each filter worker drops its clone of the
//! downstream sender when the upstream queue disconnects, and the hash
//! queue is complete once the last clone is gone. The sender reference
//! count is the atomic active-producer counter; no stage ever tests "is
//! the queue empty".
//!
//! Every queue take uses a short timeout so the shared cancellation flag
//! is observed promptly, and no lock is held across a take or a file read.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use super::{ScanHandle, ScanSession, SessionConfig};
use crate::scanner::{Digester, Enumerator, FileCandidate};

/// How long a worker blocks on its queue before re-checking cancellation.
const QUEUE_POLL: Duration = Duration::from_millis(100);

/// Spawn every stage for `session` and return the consumer handle.
pub(super) fn spawn(
    session: Arc<ScanSession>,
    digester: Arc<dyn Digester>,
    config: &SessionConfig,
) -> ScanHandle {
    let (path_tx, path_rx) = unbounded::<PathBuf>();
    let (candidate_tx, candidate_rx) = unbounded::<PathBuf>();

    let mut stages = Vec::with_capacity(1 + config.filter_workers + config.hash_workers);

    // Stage 1: one enumerator. Its sender is moved in and dropped on
    // return, which is the filter stage's completion marker.
    {
        let session = Arc::clone(&session);
        stages.push(thread::spawn(move || {
            let enumerator = Enumerator::new(&session.root, Arc::clone(&session.cancel));
            enumerator.run(&path_tx, Some(&session.files_seen));
        }));
    }

    // Stage 2: size-filter workers, each with its own clone of the
    // downstream sender.
    for _ in 0..config.filter_workers {
        let session = Arc::clone(&session);
        let rx = path_rx.clone();
        let tx = candidate_tx.clone();
        stages.push(thread::spawn(move || filter_worker(&session, &rx, &tx)));
    }

    // Stage 3: hash workers.
    for _ in 0..config.hash_workers {
        let session = Arc::clone(&session);
        let rx = candidate_rx.clone();
        let digester = Arc::clone(&digester);
        let batch_size = config.batch_size;
        stages.push(thread::spawn(move || {
            hash_worker(&session, &rx, digester.as_ref(), batch_size);
        }));
    }

    // The spawner's own clones must go, or the queues never disconnect.
    drop(path_rx);
    drop(candidate_tx);
    drop(candidate_rx);

    // Watcher: joins every stage, then freezes the clock and publishes the
    // final state. This is the only place the session finishes.
    let watcher = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for stage in stages {
                let _ = stage.join();
            }
            session.finish();
            let progress = session.progress();
            log::info!(
                "Scan of {} {}: {} files seen, {} hashed, {} duplicate groups in {:.1}s",
                session.root.display(),
                progress.state,
                progress.files_seen,
                progress.files_hashed,
                progress.duplicate_groups,
                progress.elapsed.as_secs_f64()
            );
        })
    };

    ScanHandle {
        session,
        watcher: Some(watcher),
    }
}

/// Size-filter worker: stat each path, record it in its size bucket, and
/// forward whatever the bucket releases. A failed stat drops the path.
fn filter_worker(session: &ScanSession, rx: &Receiver<PathBuf>, tx: &Sender<PathBuf>) {
    loop {
        if session.is_cancel_requested() {
            return;
        }

        let path = match rx.recv_timeout(QUEUE_POLL) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };

        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        // The bucket guard is released inside observe(); only then do we
        // touch the downstream queue.
        let released = session.buckets.observe(FileCandidate::new(path, size));
        for path in released {
            if tx.send(path).is_err() {
                return;
            }
        }
    }
}

/// Hash worker: gather an opportunistic batch, digest it, and publish each
/// successful (path, digest) pair. A per-path failure is logged and
/// dropped without affecting the rest of the batch.
fn hash_worker(
    session: &ScanSession,
    rx: &Receiver<PathBuf>,
    digester: &dyn Digester,
    batch_size: usize,
) {
    loop {
        if session.is_cancel_requested() {
            return;
        }

        let first = match rx.recv_timeout(QUEUE_POLL) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };

        let mut batch = Vec::with_capacity(batch_size);
        batch.push(first);
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(path) => batch.push(path),
                Err(_) => break,
            }
        }

        // Discard the gathered batch cleanly if cancellation arrived while
        // we were collecting it.
        if session.is_cancel_requested() {
            return;
        }

        let results = digester.digest_batch(&batch);
        for (path, result) in batch.into_iter().zip(results) {
            match result {
                Ok(digest) => {
                    session.index.insert(digest, path);
                    session.files_hashed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }
}
