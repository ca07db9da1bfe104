//! Local execution engine
//!
//! Runs the extractor and aggregator as an in-process map → (combine) →
//! shuffle → reduce job. Map and reduce tasks are CPU-bound and run on tokio's
//! blocking pool, bounded by `max_parallel`.

pub mod input;
pub mod map;
pub mod output;
pub mod reduce;
pub mod shuffle;
pub mod summary;

pub use input::{discover_splits, discover_splits_excluding, InputSplit};
pub use map::{run_map_task, MapCounters, MapOutput};
pub use output::{OutputWriter, SUCCESS_MARKER, SUMMARY_FILE};
pub use reduce::{run_reduce_task, ReduceOutput};
pub use shuffle::{Partitioner, ShuffleBuffer};
pub use summary::JobSummary;

use crate::config::JobConfig;
use crate::core::{Aggregator, PairCount};
use crate::error::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Retained pairs of a finished job, one list per reduce partition
#[derive(Debug, Clone)]
pub struct JobResult {
    pub partitions: Vec<Vec<PairCount>>,
    pub summary: JobSummary,
}

impl JobResult {
    /// Every retained pair across all partitions
    pub fn pairs(&self) -> impl Iterator<Item = &PairCount> {
        self.partitions.iter().flatten()
    }

    /// Retained pairs as a key-sorted map of key to total
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        self.pairs()
            .map(|pair| (pair.key.to_string(), pair.count))
            .collect()
    }
}

/// A configured co-occurrence job
#[derive(Debug, Clone)]
pub struct Job {
    config: Arc<JobConfig>,
    combiner: Option<Aggregator>,
    reducer: Aggregator,
    partitioner: Partitioner,
}

impl Job {
    pub fn new(config: JobConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            combiner: config.combiner(),
            reducer: config.reducer(),
            partitioner: Partitioner::new(config.reducers),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run over in-memory records, chunked into splits of `split_records`
    pub async fn execute_records(&self, records: Vec<String>) -> Result<JobResult> {
        let splits = InputSplit::chunked(records, self.config.split_records);
        self.execute(splits).await
    }

    /// Run the map, shuffle and reduce phases without touching the output
    pub async fn execute(&self, splits: Vec<InputSplit>) -> Result<JobResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut summary = JobSummary {
            job_name: self.config.name.clone(),
            started_at,
            duration_secs: 0.0,
            threshold: self.config.threshold,
            partial_aggregation: self.combiner.is_some(),
            reducers: self.partitioner.partitions(),
            input_splits: splits.len(),
            map_input_records: 0,
            map_output_records: 0,
            combine_input_records: 0,
            combine_output_records: 0,
            shuffled_records: 0,
            reduce_input_groups: 0,
            reduce_input_records: 0,
            reduce_output_records: 0,
        };

        info!(
            "Starting job '{}': {} splits, {} reducers, partial aggregation {}",
            self.config.name,
            splits.len(),
            self.partitioner.partitions(),
            if self.combiner.is_some() { "on" } else { "off" }
        );
        if splits.is_empty() {
            warn!("No input splits to process");
        }

        let shuffle = self.map_phase(splits, &mut summary).await?;
        let outputs = self.reduce_phase(shuffle).await?;

        for output in &outputs {
            summary.record_reduce(output);
        }
        summary.duration_secs = start.elapsed().as_secs_f64();

        info!(
            "Job '{}' completed: {} records, {} distinct pairs, {} retained",
            self.config.name,
            summary.map_input_records,
            summary.reduce_input_groups,
            summary.reduce_output_records
        );

        Ok(JobResult {
            partitions: outputs.into_iter().map(|o| o.pairs).collect(),
            summary,
        })
    }

    /// Discover input files, execute the job and persist its output
    ///
    /// A job that fails after the output directory was prepared removes it, so
    /// a directory without `_SUCCESS` is never left behind.
    pub async fn run(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<JobSummary> {
        // Part files of an earlier run are never input, even when the output
        // directory sits inside an input directory
        let splits = discover_splits_excluding(inputs, output_dir)?;

        // Fail on an existing output directory before running any task
        let writer = OutputWriter::create(
            output_dir,
            self.config.output_format,
            self.config.overwrite,
        )
        .await?;

        match self.execute_into(splits, &writer).await {
            Ok(summary) => {
                info!("Output written to {}", writer.dir().display());
                Ok(summary)
            }
            Err(e) => {
                writer.discard().await;
                Err(e)
            }
        }
    }

    async fn execute_into(
        &self,
        splits: Vec<InputSplit>,
        writer: &OutputWriter,
    ) -> Result<JobSummary> {
        let result = self.execute(splits).await?;

        for (partition, pairs) in result.partitions.iter().enumerate() {
            writer.write_partition(partition, pairs).await?;
        }
        writer.commit(&result.summary).await?;

        Ok(result.summary)
    }

    async fn map_phase(
        &self,
        splits: Vec<InputSplit>,
        summary: &mut JobSummary,
    ) -> Result<ShuffleBuffer> {
        info!("Starting map phase with {} splits", splits.len());
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel));
        let mut tasks = JoinSet::new();

        for split in splits {
            let permit = semaphore.clone().acquire_owned().await?;
            let combiner = self.combiner;
            let partitioner = self.partitioner;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                run_map_task(&split, combiner, partitioner)
            });
        }

        let mut shuffle = ShuffleBuffer::new(&self.partitioner);
        while let Some(joined) = tasks.join_next().await {
            let output = joined??;
            summary.record_map(&output.counters);
            let absorbed = shuffle.absorb(output.buckets);
            summary.shuffled_records += absorbed;
            debug!("Shuffled {} contributions from {}", absorbed, output.split);
        }

        info!(
            "Map phase completed: {} records, {} pairs emitted",
            summary.map_input_records, summary.map_output_records
        );
        Ok(shuffle)
    }

    async fn reduce_phase(&self, shuffle: ShuffleBuffer) -> Result<Vec<ReduceOutput>> {
        let partitions = shuffle.into_partitions();
        info!("Starting reduce phase with {} partitions", partitions.len());

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel));
        let mut tasks = JoinSet::new();

        for (partition, groups) in partitions.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let reducer = self.reducer;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                run_reduce_task(partition, groups, reducer)
            });
        }

        let mut outputs = Vec::with_capacity(self.partitioner.partitions());
        while let Some(joined) = tasks.join_next().await {
            outputs.push(joined?);
        }
        outputs.sort_by_key(|output| output.partition);

        Ok(outputs)
    }
}
