use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Failures that end a single code's update.
///
/// "Nothing there" (missing catalog control, missing table, missing or empty
/// CSV) is never an error: those surface as empty values.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("selector {0}")]
    Selector(String),

    #[error("CSV error on {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unparseable date {value:?} in {path:?}")]
    InvalidDate { path: PathBuf, value: String },

    #[error("column {column:?} missing from {path:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("worker pool closed: {0}")]
    WorkerPool(#[from] tokio::sync::AcquireError),
}

impl ScrapeError {
    pub fn persistence(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Persistence { path: path.into(), source }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
