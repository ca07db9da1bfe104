//! Routing of map output to reduce partitions
//!
//! The partitioner hashes the pair key, so every contribution for a key lands
//! in the same partition no matter which map task produced it. The shuffle
//! buffer then merges all map outputs partition by partition, giving each
//! reduce task the complete, key-sorted multiset for its keys.

use crate::core::PairKey;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// Contributions of one map task for one partition
pub type PartitionBucket = HashMap<PairKey, Vec<u64>>;

/// Complete, key-sorted contributions of one reduce partition
pub type PartitionGroups = BTreeMap<PairKey, Vec<u64>>;

/// Assigns pair keys to reduce partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    partitions: usize,
}

impl Partitioner {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Partition index of a key, stable within and across runs of one build
    pub fn partition(&self, key: &PairKey) -> usize {
        if self.partitions == 1 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.partitions as u64) as usize
    }

    /// Empty per-partition buckets for a map task
    pub fn buckets(&self) -> Vec<PartitionBucket> {
        (0..self.partitions).map(|_| HashMap::new()).collect()
    }
}

/// Accumulates map outputs until the reduce phase starts
#[derive(Debug)]
pub struct ShuffleBuffer {
    groups: Vec<PartitionGroups>,
}

impl ShuffleBuffer {
    pub fn new(partitioner: &Partitioner) -> Self {
        Self {
            groups: (0..partitioner.partitions())
                .map(|_| BTreeMap::new())
                .collect(),
        }
    }

    /// Merge one map task's buckets, returning the number of contributions taken
    pub fn absorb(&mut self, buckets: Vec<PartitionBucket>) -> u64 {
        debug_assert_eq!(buckets.len(), self.groups.len());
        let mut absorbed = 0u64;
        for (groups, bucket) in self.groups.iter_mut().zip(buckets) {
            for (key, values) in bucket {
                absorbed += values.len() as u64;
                groups.entry(key).or_default().extend(values);
            }
        }
        absorbed
    }

    pub fn into_partitions(self) -> Vec<PartitionGroups> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_partition_takes_everything() {
        let partitioner = Partitioner::new(1);
        assert_eq!(partitioner.partition(&PairKey::from_tags("#a", "#b")), 0);
    }

    #[test]
    fn test_zero_partitions_is_clamped() {
        assert_eq!(Partitioner::new(0).partitions(), 1);
    }

    #[test]
    fn test_partition_is_stable_and_in_range() {
        let partitioner = Partitioner::new(7);
        for i in 0..100 {
            let key = PairKey::from_tags("#tag", &format!("#other{i}"));
            let first = partitioner.partition(&key);
            assert!(first < 7);
            assert_eq!(first, partitioner.partition(&key.clone()));
        }
    }

    #[test]
    fn test_absorb_merges_across_map_tasks() {
        let partitioner = Partitioner::new(3);
        let key = PairKey::from_tags("#a", "#b");
        let index = partitioner.partition(&key);

        let mut shuffle = ShuffleBuffer::new(&partitioner);
        for values in [vec![1, 1], vec![5]] {
            let mut buckets = partitioner.buckets();
            buckets[index].insert(key.clone(), values);
            shuffle.absorb(buckets);
        }

        let partitions = shuffle.into_partitions();
        assert_eq!(partitions.len(), 3);
        let mut merged = partitions[index][&key].clone();
        merged.sort();
        assert_eq!(merged, vec![1, 1, 5]);
    }

    #[test]
    fn test_absorb_counts_contributions() {
        let partitioner = Partitioner::new(1);
        let mut buckets = partitioner.buckets();
        buckets[0].insert(PairKey::from_tags("#a", "#b"), vec![1, 1, 1]);
        buckets[0].insert(PairKey::from_tags("#a", "#c"), vec![4]);

        let mut shuffle = ShuffleBuffer::new(&partitioner);
        assert_eq!(shuffle.absorb(buckets), 4);
    }
}
