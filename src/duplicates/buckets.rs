//! Size-bucket table: groups observed paths by file size and decides which
//! of them continue to the hashing stage.
//!
//! Files with a unique size cannot be duplicates, so they are buffered here
//! and never hashed. The first and second arrival for a size are both
//! released once the second arrives; every later arrival is released
//! individually. The insert and the release decision are a single atomic
//! step per bucket, so concurrent filter workers can share one table
//! without double-releasing or losing a path.

use std::path::PathBuf;

use dashmap::DashMap;

use crate::scanner::FileCandidate;

/// Concurrent size → paths table.
///
/// Buckets grow monotonically during a scan and are never removed; a path
/// appears in at most one bucket (the one matching its size at stat time).
#[derive(Debug, Default)]
pub struct SizeBuckets {
    buckets: DashMap<u64, Vec<PathBuf>>,
}

impl SizeBuckets {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Record a candidate and return the paths released for hashing.
    ///
    /// Returns an empty vector for the first arrival of a size, both the
    /// buffered first and the new second arrival when the bucket reaches
    /// two members, and just the new arrival for every later member. The
    /// bucket mutation and the release decision happen under one bucket
    /// guard; the guard is dropped before the caller touches any queue.
    #[must_use]
    pub fn observe(&self, candidate: FileCandidate) -> Vec<PathBuf> {
        let FileCandidate { path, size } = candidate;

        let mut bucket = self.buckets.entry(size).or_default();
        bucket.push(path.clone());

        match bucket.len() {
            1 => Vec::new(),
            2 => bucket.clone(),
            _ => vec![path],
        }
    }

    /// Number of distinct sizes observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no sizes have been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of paths buffered for a given size.
    #[must_use]
    pub fn bucket_len(&self, size: u64) -> usize {
        self.buckets.get(&size).map_or(0, |b| b.len())
    }

    /// Total number of paths across all buckets.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn candidate(path: &str, size: u64) -> FileCandidate {
        FileCandidate::new(PathBuf::from(path), size)
    }

    #[test]
    fn test_first_arrival_buffered() {
        let buckets = SizeBuckets::new();
        let released = buckets.observe(candidate("/a.txt", 100));

        assert!(released.is_empty());
        assert_eq!(buckets.bucket_len(100), 1);
    }

    #[test]
    fn test_second_arrival_releases_both() {
        let buckets = SizeBuckets::new();
        assert!(buckets.observe(candidate("/a.txt", 100)).is_empty());

        let released = buckets.observe(candidate("/b.txt", 100));
        assert_eq!(
            released,
            vec![PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]
        );
    }

    #[test]
    fn test_later_arrivals_release_singly() {
        let buckets = SizeBuckets::new();
        let _ = buckets.observe(candidate("/a.txt", 100));
        let _ = buckets.observe(candidate("/b.txt", 100));

        let released = buckets.observe(candidate("/c.txt", 100));
        assert_eq!(released, vec![PathBuf::from("/c.txt")]);

        let released = buckets.observe(candidate("/d.txt", 100));
        assert_eq!(released, vec![PathBuf::from("/d.txt")]);
    }

    #[test]
    fn test_sizes_are_independent() {
        let buckets = SizeBuckets::new();
        assert!(buckets.observe(candidate("/a.txt", 100)).is_empty());
        assert!(buckets.observe(candidate("/b.txt", 200)).is_empty());

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.total_paths(), 2);
    }

    #[test]
    fn test_singleton_never_released() {
        let buckets = SizeBuckets::new();
        let released = buckets.observe(candidate("/only.txt", 42));

        assert!(released.is_empty());
        assert_eq!(buckets.bucket_len(42), 1);
    }

    #[test]
    fn test_concurrent_observe_no_double_release() {
        // Many threads push paths of the same size; every path must be
        // released exactly once in total (the bucket ends with > 2
        // members, so no path stays buffered).
        let buckets = Arc::new(SizeBuckets::new());
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let buckets = Arc::clone(&buckets);
                thread::spawn(move || {
                    let mut released = Vec::new();
                    for i in 0..per_thread {
                        let c = candidate(&format!("/t{}/f{}.bin", t, i), 7);
                        released.extend(buckets.observe(c));
                    }
                    released
                })
            })
            .collect();

        let mut all_released = Vec::new();
        for handle in handles {
            all_released.extend(handle.join().unwrap());
        }

        let total = threads * per_thread;
        assert_eq!(all_released.len(), total, "each path released exactly once");

        let unique: HashSet<_> = all_released.iter().collect();
        assert_eq!(unique.len(), total, "no path released twice");
        assert_eq!(buckets.bucket_len(7), total);
    }
}
