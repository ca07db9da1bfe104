//! Reduce task: final aggregation of one partition

use super::shuffle::PartitionGroups;
use crate::core::{Aggregator, PairCount, Tally};
use tracing::debug;

/// Retained pairs and counters of one reduce partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceOutput {
    pub partition: usize,
    pub input_groups: u64,
    pub input_records: u64,
    /// Retained pairs in key order
    pub pairs: Vec<PairCount>,
}

pub fn run_reduce_task(
    partition: usize,
    groups: PartitionGroups,
    reducer: Aggregator,
) -> ReduceOutput {
    let mut output = ReduceOutput {
        partition,
        input_groups: groups.len() as u64,
        input_records: 0,
        pairs: Vec::new(),
    };

    for (key, values) in groups {
        let tally: Tally = values.into_iter().collect();
        output.input_records += tally.contributions;

        if let Some(pair) = reducer.finish(key, tally) {
            debug!(
                key = %pair.key,
                contributions = tally.contributions,
                total = tally.total,
                "Retained pair"
            );
            output.pairs.push(pair);
        }
    }

    debug!(
        "Reduce partition {} done: {} keys in, {} retained",
        partition,
        output.input_groups,
        output.pairs.len()
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PairKey;

    #[test]
    fn test_reduce_filters_and_keeps_key_order() {
        let mut groups = PartitionGroups::new();
        groups.insert(PairKey::from_tags("#x", "#y"), vec![150, 60]);
        groups.insert(PairKey::from_tags("#a", "#c"), vec![1; 200]);
        groups.insert(PairKey::from_tags("#a", "#b"), vec![100, 100, 1]);

        let output = run_reduce_task(2, groups, Aggregator::default());

        assert_eq!(output.partition, 2);
        assert_eq!(output.input_groups, 3);
        assert_eq!(output.input_records, 205);
        let kept: Vec<(&str, u64)> = output
            .pairs
            .iter()
            .map(|p| (p.key.as_str(), p.count))
            .collect();
        assert_eq!(kept, vec![("#a_#b", 201), ("#x_#y", 210)]);
    }

    #[test]
    fn test_reduce_empty_partition() {
        let output = run_reduce_task(0, PartitionGroups::new(), Aggregator::default());
        assert_eq!(output.input_groups, 0);
        assert!(output.pairs.is_empty());
    }
}
