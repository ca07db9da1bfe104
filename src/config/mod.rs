//! Job configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `TAGPAIRS_*` environment variables, then CLI flags (applied by the binary).

use crate::core::{Aggregator, DEFAULT_RETENTION_THRESHOLD};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Serialization of the retained pairs in each part file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `key<TAB>count` per line
    #[default]
    Tsv,
    /// One JSON object per line
    Jsonl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Job name, reported in logs and the summary
    pub name: String,

    /// Pairs are kept only when their total is strictly greater than this
    pub threshold: u64,

    /// Combine map output per task before the shuffle
    pub enable_partial_aggregation: bool,

    /// Number of reduce partitions (and part files)
    pub reducers: usize,

    /// Maximum number of map or reduce tasks running at once
    pub max_parallel: usize,

    /// Records per split when the input is an in-memory record list
    pub split_records: usize,

    pub output_format: OutputFormat,

    /// Replace an existing output directory instead of failing
    pub overwrite: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            threshold: DEFAULT_RETENTION_THRESHOLD,
            enable_partial_aggregation: false,
            reducers: 1,
            max_parallel: default_max_parallel(),
            split_records: 10_000,
            output_format: OutputFormat::Tsv,
            overwrite: false,
        }
    }
}

fn default_job_name() -> String {
    "hashtag-cooccurrence".to_string()
}

fn default_max_parallel() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl JobConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Apply `TAGPAIRS_*` environment overrides
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TAGPAIRS_THRESHOLD") {
            self.threshold = parse_var("TAGPAIRS_THRESHOLD", &value)?;
        }

        if let Some(value) = lookup("TAGPAIRS_PARTIAL_AGGREGATION") {
            self.enable_partial_aggregation = parse_var("TAGPAIRS_PARTIAL_AGGREGATION", &value)?;
        }

        if let Some(value) = lookup("TAGPAIRS_REDUCERS") {
            self.reducers = parse_var("TAGPAIRS_REDUCERS", &value)?;
        }

        if let Some(value) = lookup("TAGPAIRS_MAX_PARALLEL") {
            self.max_parallel = parse_var("TAGPAIRS_MAX_PARALLEL", &value)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reducers == 0 {
            return Err(Error::Config("reducers must be at least 1".to_string()));
        }
        if self.max_parallel == 0 {
            return Err(Error::Config("max_parallel must be at least 1".to_string()));
        }
        if self.split_records == 0 {
            return Err(Error::Config("split_records must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Final aggregator for this job
    pub fn reducer(&self) -> Aggregator {
        Aggregator::with_threshold(self.threshold)
    }

    /// Combiner for this job, when partial aggregation is on
    pub fn combiner(&self) -> Option<Aggregator> {
        self.enable_partial_aggregation.then(Aggregator::combiner)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid value for {name}: {value:?} ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.threshold, 200);
        assert!(!config.enable_partial_aggregation);
        assert_eq!(config.reducers, 1);
        assert!(config.max_parallel >= 1);
        assert_eq!(config.output_format, OutputFormat::Tsv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = JobConfig::from_toml(
            r#"
            threshold = 50
            enable_partial_aggregation = true
            output_format = "jsonl"
            "#,
        )
        .unwrap();
        assert_eq!(config.threshold, 50);
        assert!(config.enable_partial_aggregation);
        assert_eq!(config.output_format, OutputFormat::Jsonl);
        assert_eq!(config.name, "hashtag-cooccurrence");
        assert_eq!(config.reducers, 1);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = JobConfig::from_toml("threshold = \"lots\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("TAGPAIRS_THRESHOLD", "10"),
            ("TAGPAIRS_PARTIAL_AGGREGATION", "true"),
            ("TAGPAIRS_REDUCERS", " 4 "),
        ]
        .into_iter()
        .collect();

        let mut config = JobConfig::default();
        config
            .merge_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.threshold, 10);
        assert!(config.enable_partial_aggregation);
        assert_eq!(config.reducers, 4);
    }

    #[test]
    fn test_merge_vars_rejects_garbage() {
        let mut config = JobConfig::default();
        let err = config
            .merge_vars(|name| (name == "TAGPAIRS_REDUCERS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("TAGPAIRS_REDUCERS"));
    }

    #[test]
    fn test_validate_rejects_zero_reducers() {
        let config = JobConfig {
            reducers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_combiner_follows_flag() {
        let mut config = JobConfig::default();
        assert!(config.combiner().is_none());
        config.enable_partial_aggregation = true;
        assert_eq!(config.combiner(), Some(Aggregator::combiner()));
        assert_eq!(config.reducer().threshold(), Some(200));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, "name = \"elections\"\nreducers = 3\n").unwrap();

        let config = JobConfig::load(&path).await.unwrap();
        assert_eq!(config.name, "elections");
        assert_eq!(config.reducers, 3);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = JobConfig::load(Path::new("/nonexistent/job.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
