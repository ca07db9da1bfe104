//! Summation of pair contributions and the retention filter
//!
//! The same [`Aggregator`] serves both passes of the pipeline: a combiner
//! (no filter) folds map output into partial sums, and the final reducer
//! applies the threshold. Because [`Tally::combine`] is associative and
//! commutative, running the combiner first never changes the final totals.

use super::pair_key::PairKey;
use serde::{Deserialize, Serialize};

/// Totals at or below this value are dropped from the output
pub const DEFAULT_RETENTION_THRESHOLD: u64 = 200;

/// Running sum of the contributions seen for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Sum of all contributions
    pub total: u64,
    /// Number of contributions folded in (diagnostic only)
    pub contributions: u64,
}

impl Tally {
    /// Fold one more contribution in
    pub fn add(self, value: u64) -> Self {
        Self {
            total: self.total.saturating_add(value),
            contributions: self.contributions.saturating_add(1),
        }
    }

    /// Merge two partial tallies
    pub fn combine(self, other: Self) -> Self {
        Self {
            total: self.total.saturating_add(other.total),
            contributions: self.contributions.saturating_add(other.contributions),
        }
    }
}

impl FromIterator<u64> for Tally {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        iter.into_iter().fold(Tally::default(), Tally::add)
    }
}

impl Extend<u64> for Tally {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        *self = iter.into_iter().fold(*self, Tally::add);
    }
}

/// A pair key with its aggregated count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub key: PairKey,
    pub count: u64,
}

/// Which totals an aggregator lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Emit every total (partial aggregation)
    All,
    /// Emit totals strictly greater than the threshold
    Above(u64),
}

/// Stateless fold over the contributions of a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    retention: Retention,
}

impl Aggregator {
    /// Final aggregator keeping totals strictly greater than `threshold`
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            retention: Retention::Above(threshold),
        }
    }

    /// Partial aggregator that never filters
    pub fn combiner() -> Self {
        Self {
            retention: Retention::All,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Threshold applied by this aggregator, if any
    pub fn threshold(&self) -> Option<u64> {
        match self.retention {
            Retention::All => None,
            Retention::Above(threshold) => Some(threshold),
        }
    }

    /// Check whether a total passes the retention filter
    pub fn retains(&self, total: u64) -> bool {
        match self.retention {
            Retention::All => true,
            Retention::Above(threshold) => total > threshold,
        }
    }

    /// Sum every contribution for `key` and apply the retention filter
    ///
    /// # Examples
    ///
    /// ```
    /// use tagpairs::core::Aggregator;
    ///
    /// let reducer = Aggregator::with_threshold(200);
    /// assert!(reducer.aggregate("#a_#b", vec![1; 200]).is_none());
    ///
    /// let kept = reducer.aggregate("#a_#b", [150, 51]).unwrap();
    /// assert_eq!(kept.count, 201);
    /// ```
    pub fn aggregate<K, I>(&self, key: K, values: I) -> Option<PairCount>
    where
        K: Into<PairKey>,
        I: IntoIterator<Item = u64>,
    {
        self.finish(key, values.into_iter().collect())
    }

    /// Apply the retention filter to an already folded tally
    pub fn finish<K: Into<PairKey>>(&self, key: K, tally: Tally) -> Option<PairCount> {
        self.retains(tally.total).then(|| PairCount {
            key: key.into(),
            count: tally.total,
        })
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_RETENTION_THRESHOLD)
    }
}
