//! Persistence of retained pairs
//!
//! Output directory layout:
//! - `part-r-00000`, `part-r-00001`, ... one file per reduce partition
//! - `_SUMMARY.json` job counters
//! - `_SUCCESS` empty marker, written last

use super::summary::JobSummary;
use crate::config::OutputFormat;
use crate::core::PairCount;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const SUMMARY_FILE: &str = "_SUMMARY.json";

/// Name of the part file for a reduce partition
pub fn part_file_name(partition: usize) -> String {
    format!("part-r-{partition:05}")
}

/// Render retained pairs in the requested format
pub fn render(pairs: &[PairCount], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    for pair in pairs {
        match format {
            OutputFormat::Tsv => {
                out.push_str(&format!("{}\t{}\n", pair.key, pair.count));
            }
            OutputFormat::Jsonl => {
                out.push_str(&serde_json::to_string(pair)?);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Writes part files into a job output directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl OutputWriter {
    /// Prepare the output directory
    ///
    /// Fails if the directory already exists, unless `overwrite` is set.
    pub async fn create(dir: &Path, format: OutputFormat, overwrite: bool) -> Result<Self> {
        if dir.exists() {
            if !overwrite {
                return Err(Error::OutputExists(dir.to_path_buf()));
            }
            warn!("Replacing existing output directory {}", dir.display());
            fs::remove_dir_all(dir).await?;
        }
        fs::create_dir_all(dir).await?;

        Ok(Self {
            dir: dir.to_path_buf(),
            format,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn write_partition(&self, partition: usize, pairs: &[PairCount]) -> Result<PathBuf> {
        let path = self.dir.join(part_file_name(partition));
        fs::write(&path, render(pairs, self.format)?).await?;
        debug!("Wrote {} pairs to {}", pairs.len(), path.display());
        Ok(path)
    }

    /// Remove the directory of a job that failed before `commit`
    pub async fn discard(&self) {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => warn!("Removed incomplete output directory {}", self.dir.display()),
            Err(e) => warn!(
                "Failed to remove incomplete output directory {}: {}",
                self.dir.display(),
                e
            ),
        }
    }

    /// Write the summary and the success marker
    pub async fn commit(&self, summary: &JobSummary) -> Result<()> {
        let summary_json = serde_json::to_string_pretty(summary)?;
        fs::write(self.dir.join(SUMMARY_FILE), summary_json).await?;
        fs::write(self.dir.join(SUCCESS_MARKER), "").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PairKey;
    use tempfile::TempDir;

    fn pairs() -> Vec<PairCount> {
        vec![
            PairCount {
                key: PairKey::from_tags("#a", "#b"),
                count: 201,
            },
            PairCount {
                key: PairKey::from_tags("#x", "#y"),
                count: 999,
            },
        ]
    }

    #[test]
    fn test_part_file_name() {
        assert_eq!(part_file_name(0), "part-r-00000");
        assert_eq!(part_file_name(12), "part-r-00012");
    }

    #[test]
    fn test_render_tsv() {
        let text = render(&pairs(), OutputFormat::Tsv).unwrap();
        assert_eq!(text, "#a_#b\t201\n#x_#y\t999\n");
    }

    #[test]
    fn test_render_jsonl() {
        let text = render(&pairs(), OutputFormat::Jsonl).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first, r##"{"key":"#a_#b","count":201}"##);
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_existing_dir_rejected_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let err = OutputWriter::create(dir.path(), OutputFormat::Tsv, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
    }

    #[tokio::test]
    async fn test_discard_removes_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let writer = OutputWriter::create(&out, OutputFormat::Tsv, false)
            .await
            .unwrap();
        writer.write_partition(0, &pairs()).await.unwrap();

        writer.discard().await;
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("stale.txt"), "old").unwrap();

        let writer = OutputWriter::create(&out, OutputFormat::Tsv, true)
            .await
            .unwrap();
        let path = writer.write_partition(0, &pairs()).await.unwrap();

        assert!(!out.join("stale.txt").exists());
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "#a_#b\t201\n#x_#y\t999\n"
        );
    }
}
