//! Consumer-facing duplicate feed.
//!
//! A feed filters index snapshots through a set of already-surfaced
//! digests, so a polling consumer (the console, an exporter) receives each
//! qualifying group exactly once and never sees a repeat. Independent
//! consumers hold independent feeds over the same index and may poll at
//! different cadences.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::index::DuplicateIndex;
use crate::scanner::Digest;

/// One duplicate group rendered for display or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRow {
    /// First member discovered
    pub primary: PathBuf,
    /// Second member discovered, if the group had one at snapshot time
    pub secondary: Option<PathBuf>,
    /// Content digest, 32 lowercase hex characters
    pub digest: String,
    /// Whether the group had three or more members at snapshot time
    pub more_than_two: bool,
}

/// Exactly-once view over a session's duplicate index.
#[derive(Debug)]
pub struct DuplicateFeed {
    index: Arc<DuplicateIndex>,
    displayed: HashSet<Digest>,
}

impl DuplicateFeed {
    /// Create a feed over the given index with nothing surfaced yet.
    #[must_use]
    pub fn new(index: Arc<DuplicateIndex>) -> Self {
        Self {
            index,
            displayed: HashSet::new(),
        }
    }

    /// Return rows for every group that qualified (reached two members)
    /// since the last poll. A group already surfaced is never re-emitted,
    /// even if it has grown since.
    pub fn poll_new(&mut self) -> Vec<DuplicateRow> {
        let mut rows = Vec::new();

        for group in self.index.snapshot_duplicates() {
            if !self.displayed.insert(group.digest) {
                continue;
            }

            rows.push(DuplicateRow {
                primary: group.primary().cloned().unwrap_or_default(),
                secondary: group.secondary().cloned(),
                digest: group.digest_hex(),
                more_than_two: group.more_than_two(),
            });
        }

        rows
    }

    /// Number of groups surfaced so far.
    #[must_use]
    pub fn surfaced_count(&self) -> usize {
        self.displayed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(seed: u8) -> Digest {
        [seed; 16]
    }

    #[test]
    fn test_poll_surfaces_qualifying_groups() {
        let index = Arc::new(DuplicateIndex::new());
        index.insert(digest(1), PathBuf::from("/a.txt"));
        index.insert(digest(1), PathBuf::from("/b.txt"));
        index.insert(digest(2), PathBuf::from("/single.txt"));

        let mut feed = DuplicateFeed::new(Arc::clone(&index));
        let rows = feed.poll_new();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primary, PathBuf::from("/a.txt"));
        assert_eq!(rows[0].secondary, Some(PathBuf::from("/b.txt")));
        assert!(!rows[0].more_than_two);
        assert_eq!(rows[0].digest.len(), 32);
    }

    #[test]
    fn test_each_group_surfaced_exactly_once() {
        let index = Arc::new(DuplicateIndex::new());
        index.insert(digest(1), PathBuf::from("/a.txt"));
        index.insert(digest(1), PathBuf::from("/b.txt"));

        let mut feed = DuplicateFeed::new(Arc::clone(&index));
        assert_eq!(feed.poll_new().len(), 1);
        assert!(feed.poll_new().is_empty());

        // The group growing afterwards does not re-surface it.
        index.insert(digest(1), PathBuf::from("/c.txt"));
        assert!(feed.poll_new().is_empty());
        assert_eq!(feed.surfaced_count(), 1);
    }

    #[test]
    fn test_groups_qualify_incrementally() {
        let index = Arc::new(DuplicateIndex::new());
        let mut feed = DuplicateFeed::new(Arc::clone(&index));

        index.insert(digest(1), PathBuf::from("/a.txt"));
        assert!(feed.poll_new().is_empty(), "singleton must not surface");

        index.insert(digest(1), PathBuf::from("/b.txt"));
        let rows = feed.poll_new();
        assert_eq!(rows.len(), 1);

        index.insert(digest(2), PathBuf::from("/x.txt"));
        index.insert(digest(2), PathBuf::from("/y.txt"));
        let rows = feed.poll_new();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primary, PathBuf::from("/x.txt"));
    }

    #[test]
    fn test_independent_feeds_surface_independently() {
        let index = Arc::new(DuplicateIndex::new());
        index.insert(digest(1), PathBuf::from("/a.txt"));
        index.insert(digest(1), PathBuf::from("/b.txt"));

        let mut console = DuplicateFeed::new(Arc::clone(&index));
        let mut exporter = DuplicateFeed::new(Arc::clone(&index));

        assert_eq!(console.poll_new().len(), 1);
        assert_eq!(exporter.poll_new().len(), 1, "feeds do not share state");
    }

    #[test]
    fn test_more_than_two_reflects_snapshot_time() {
        let index = Arc::new(DuplicateIndex::new());
        index.insert(digest(1), PathBuf::from("/a.txt"));
        index.insert(digest(1), PathBuf::from("/b.txt"));
        index.insert(digest(1), PathBuf::from("/c.txt"));

        let mut feed = DuplicateFeed::new(Arc::clone(&index));
        let rows = feed.poll_new();
        assert!(rows[0].more_than_two);
    }
}
