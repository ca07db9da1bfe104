//! Job counters

use super::map::MapCounters;
use super::reduce::ReduceOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters and settings of a finished job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub threshold: u64,
    pub partial_aggregation: bool,
    pub reducers: usize,
    pub input_splits: usize,
    pub map_input_records: u64,
    pub map_output_records: u64,
    pub combine_input_records: u64,
    pub combine_output_records: u64,
    /// Contributions handed from map tasks to the shuffle
    pub shuffled_records: u64,
    pub reduce_input_groups: u64,
    pub reduce_input_records: u64,
    pub reduce_output_records: u64,
}

impl JobSummary {
    pub fn record_map(&mut self, counters: &MapCounters) {
        self.map_input_records += counters.input_records;
        self.map_output_records += counters.output_records;
        self.combine_input_records += counters.combine_input_records;
        self.combine_output_records += counters.combine_output_records;
    }

    pub fn record_reduce(&mut self, output: &ReduceOutput) {
        self.reduce_input_groups += output.input_groups;
        self.reduce_input_records += output.input_records;
        self.reduce_output_records += output.pairs.len() as u64;
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Job '{}' finished in {:.2}s", self.job_name, self.duration_secs)?;
        writeln!(f, "  Input splits:           {}", self.input_splits)?;
        writeln!(f, "  Map input records:      {}", self.map_input_records)?;
        writeln!(f, "  Map output records:     {}", self.map_output_records)?;
        if self.partial_aggregation {
            writeln!(f, "  Combine input records:  {}", self.combine_input_records)?;
            writeln!(f, "  Combine output records: {}", self.combine_output_records)?;
        }
        writeln!(f, "  Shuffled records:       {}", self.shuffled_records)?;
        writeln!(f, "  Reduce input groups:    {}", self.reduce_input_groups)?;
        writeln!(f, "  Reduce input records:   {}", self.reduce_input_records)?;
        write!(
            f,
            "  Reduce output records:  {} (total > {})",
            self.reduce_output_records, self.threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PairCount, PairKey};

    fn empty_summary() -> JobSummary {
        JobSummary {
            job_name: "test".to_string(),
            started_at: Utc::now(),
            duration_secs: 0.0,
            threshold: 200,
            partial_aggregation: true,
            reducers: 1,
            input_splits: 0,
            map_input_records: 0,
            map_output_records: 0,
            combine_input_records: 0,
            combine_output_records: 0,
            shuffled_records: 0,
            reduce_input_groups: 0,
            reduce_input_records: 0,
            reduce_output_records: 0,
        }
    }

    #[test]
    fn test_record_counters() {
        let mut summary = empty_summary();
        summary.record_map(&MapCounters {
            input_records: 10,
            output_records: 6,
            combine_input_records: 6,
            combine_output_records: 2,
        });
        summary.record_reduce(&ReduceOutput {
            partition: 0,
            input_groups: 2,
            input_records: 2,
            pairs: vec![PairCount {
                key: PairKey::from_tags("#a", "#b"),
                count: 300,
            }],
        });

        assert_eq!(summary.map_input_records, 10);
        assert_eq!(summary.combine_output_records, 2);
        assert_eq!(summary.reduce_output_records, 1);
        assert!(summary.to_string().contains("Combine output records: 2"));
    }

    #[test]
    fn test_summary_json_roundtrip() {
        let summary = empty_summary();
        let json = serde_json::to_string(&summary).unwrap();
        let parsed: JobSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
