//! # tagpairs
//!
//! Counts how often pairs of hashtags appear together in the same tweet,
//! keeping only the pairs seen more than a threshold number of times.
//!
//! ## Usage
//!
//! ```bash
//! tagpairs run corpus/ -o out [--combine] [--reducers 4] [--threshold 200]
//! ```
//!
//! ## Modules
//!
//! - `core` - Pure extractor and aggregator, usable from any batch engine
//! - `engine` - Local map/combine/shuffle/reduce execution over files
//! - `config` - Job configuration from TOML, environment and CLI
//! - `error` - Error type for the engine and configuration layers
pub mod config;
pub mod core;
pub mod engine;
pub mod error;

pub use crate::config::{JobConfig, OutputFormat};
pub use crate::core::{aggregate, extract, Aggregator, PairCount, PairKey, Tally};
pub use crate::engine::{Job, JobResult, JobSummary};
pub use crate::error::{Error, Result};
