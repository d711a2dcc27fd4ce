//! Error types for shard generation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShardError {
    /// A file could not be created, read or written.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a shard stream failed.
    #[error("shard stream I/O failed: {0}")]
    Stream(#[from] std::io::Error),

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A patient with a labelled sample has no demographics row.
    #[error("no demographics for patient index {patient_index}")]
    MissingDemographics { patient_index: u32 },

    #[error("invalid split ratios: train {train}, valid {valid}")]
    InvalidRatio { train: f64, valid: f64 },

    /// A shard line could not be parsed.
    #[error("malformed shard line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, ShardError>;
