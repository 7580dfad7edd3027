//! Duplicate index: the concurrency-safe map from content digest to the
//! set of paths sharing it.
//!
//! Hash workers insert concurrently while consumers take snapshots; each
//! group's member list is only ever read or extended under its shard
//! guard, so a snapshot never observes a half-applied insert. Whether a
//! group has "more than two" members is derived from the member count at
//! read time, never stored.

use std::path::PathBuf;

use dashmap::DashMap;

use crate::scanner::{digest_to_hex, Digest};

/// A group of paths sharing one content digest.
///
/// Members are kept in insertion order; the first two discovered are the
/// primary and secondary for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// Member paths in insertion order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// First member discovered.
    #[must_use]
    pub fn primary(&self) -> Option<&PathBuf> {
        self.paths.first()
    }

    /// Second member discovered.
    #[must_use]
    pub fn secondary(&self) -> Option<&PathBuf> {
        self.paths.get(1)
    }

    /// Whether the group has three or more members. Derived, never stored.
    #[must_use]
    pub fn more_than_two(&self) -> bool {
        self.paths.len() >= 3
    }

    /// Digest as a 32-character lowercase hex string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }
}

/// Concurrent digest → paths index.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    groups: DashMap<Digest, Vec<PathBuf>>,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
        }
    }

    /// Record that `path` has content digest `digest`.
    ///
    /// Each hashed file is expected to be inserted exactly once; the index
    /// does not deduplicate repeated inserts of the same pair.
    pub fn insert(&self, digest: Digest, path: PathBuf) {
        self.groups.entry(digest).or_default().push(path);
    }

    /// Number of distinct digests seen so far.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of groups with at least two members.
    #[must_use]
    pub fn duplicate_group_count(&self) -> usize {
        self.groups.iter().filter(|g| g.value().len() >= 2).count()
    }

    /// Snapshot every group with at least two members as of this call.
    ///
    /// Each group's member list is cloned under its shard guard, so the
    /// list is internally consistent even while workers keep inserting.
    /// Groups are returned sorted by digest for deterministic output; a
    /// singleton group is retained in the index but never appears here.
    #[must_use]
    pub fn snapshot_duplicates(&self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .groups
            .iter()
            .filter(|entry| entry.value().len() >= 2)
            .map(|entry| DuplicateGroup {
                digest: *entry.key(),
                paths: entry.value().clone(),
            })
            .collect();

        groups.sort_by(|a, b| a.digest.cmp(&b.digest));
        groups
    }
}
