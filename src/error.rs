use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Input path not found: {}", .0.display())]
    InputNotFound(PathBuf),

    // Raised by the input reader, before any record reaches the extractor
    #[error("Invalid UTF-8 on line {line} of {}", path.display())]
    Decode { path: PathBuf, line: u64 },

    #[error("Output directory already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Input {} lies inside the output directory {}", input.display(), output.display())]
    InputInsideOutput { input: PathBuf, output: PathBuf },

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}

impl From<tokio::sync::AcquireError> for Error {
    fn from(err: tokio::sync::AcquireError) -> Self {
        Error::Task(format!("worker pool closed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
