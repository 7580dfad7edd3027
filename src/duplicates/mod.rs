//! Duplicate detection data structures.
//!
//! - [`buckets`]: the size-bucket table that decides which paths are worth
//!   hashing at all
//! - [`index`]: the digest-keyed duplicate index, the canonical statement
//!   of "what is a duplicate group" at any point in time
//! - [`feed`]: the consumer-facing view that surfaces each qualifying
//!   group exactly once

pub mod buckets;
pub mod feed;
pub mod index;

pub use buckets::SizeBuckets;
pub use feed::{DuplicateFeed, DuplicateRow};
pub use index::{DuplicateIndex, DuplicateGroup};
