use std::path::PathBuf;

use thiserror::Error;

/// Failures reading the corpus. Callers skip the offending file and keep going.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed series '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SeriesError {
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SeriesError::Malformed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Rejections when building a query window.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Query window is empty")]
    Empty,

    #[error("Query window needs at least {min} values, got {len}")]
    TooShort { len: usize, min: usize },

    #[error("Query value at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("Query cannot be normalized: last value is {0}")]
    ZeroLast(f64),

    #[error("Normalized query must end at 1.0, ends at {0}")]
    NotNormalized(f64),
}

/// Per-candidate failures in the prediction reconstructor. Each drops one candidate.
#[derive(Debug, Error)]
pub enum ReconstructError {
    #[error(
        "Insufficient data in series {series_index} at offset {offset}: need {needed} values, have {available}"
    )]
    InsufficientData {
        series_index: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Prediction path size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Failures that stop a search before any worker starts.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),

    #[error("Insufficient corpus: requested {requested} files, {available} available")]
    InsufficientCorpus { requested: usize, available: usize },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
