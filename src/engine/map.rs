//! Map task: extraction, optional combining, and partitioning of one split

use super::input::InputSplit;
use super::shuffle::{PartitionBucket, Partitioner};
use crate::core::{extract, Aggregator, PairKey, Tally};
use crate::error::Result;
use std::collections::HashMap;
use tracing::debug;

/// Counters reported by a single map task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapCounters {
    pub input_records: u64,
    pub output_records: u64,
    pub combine_input_records: u64,
    pub combine_output_records: u64,
}

/// Partitioned output of one map task
#[derive(Debug)]
pub struct MapOutput {
    pub split: String,
    pub counters: MapCounters,
    pub buckets: Vec<PartitionBucket>,
}

/// Run the extractor over every record of a split
///
/// With a combiner, contributions are folded per key inside the task so each
/// key leaves the task as a single partial sum.
pub fn run_map_task(
    split: &InputSplit,
    combiner: Option<Aggregator>,
    partitioner: Partitioner,
) -> Result<MapOutput> {
    let mut counters = MapCounters::default();

    let buckets = match combiner {
        None => {
            let mut buckets = partitioner.buckets();
            counters.input_records = split.for_each_record(|record| {
                for (key, value) in extract(record) {
                    counters.output_records += 1;
                    let index = partitioner.partition(&key);
                    buckets[index].entry(key).or_default().push(value);
                }
            })?;
            buckets
        }
        Some(combiner) => {
            let mut tallies: HashMap<PairKey, Tally> = HashMap::new();
            counters.input_records = split.for_each_record(|record| {
                for (key, value) in extract(record) {
                    counters.output_records += 1;
                    let tally = tallies.entry(key).or_default();
                    *tally = tally.add(value);
                }
            })?;
            counters.combine_input_records = counters.output_records;
            combine(tallies, combiner, partitioner, &mut counters)
        }
    };

    debug!(
        "Map task for {} done: {} records in, {} pairs out",
        split.name(),
        counters.input_records,
        counters.output_records
    );

    Ok(MapOutput {
        split: split.name(),
        counters,
        buckets,
    })
}

fn combine(
    tallies: HashMap<PairKey, Tally>,
    combiner: Aggregator,
    partitioner: Partitioner,
    counters: &mut MapCounters,
) -> Vec<PartitionBucket> {
    let mut buckets = partitioner.buckets();
    for (key, tally) in tallies {
        if let Some(partial) = combiner.finish(key, tally) {
            counters.combine_output_records += 1;
            let index = partitioner.partition(&partial.key);
            buckets[index].insert(partial.key, vec![partial.count]);
        }
    }
    buckets
}
