//! Core co-occurrence logic with pure functions
//!
//! This module contains the two operations a batch engine registers: the
//! per-record extractor and the per-key aggregator. Following the "functional
//! core, imperative shell" pattern, everything here:
//! - Takes inputs and returns outputs
//! - Has no side effects and never fails
//! - Is safe to call from any number of workers at once

pub mod aggregator;
pub mod extractor;
pub mod pair_key;

pub use aggregator::{Aggregator, PairCount, Retention, Tally, DEFAULT_RETENTION_THRESHOLD};
pub use extractor::{extract, is_tag, tag_set, tokenize, TagPairs};
pub use pair_key::{PairKey, PAIR_SEPARATOR};

/// Aggregate one key's contributions with the default retention threshold
///
/// Returns `None` unless the sum is strictly greater than
/// [`DEFAULT_RETENTION_THRESHOLD`].
pub fn aggregate<K, I>(key: K, values: I) -> Option<PairCount>
where
    K: Into<PairKey>,
    I: IntoIterator<Item = u64>,
{
    Aggregator::default().aggregate(key, values)
}
