//! Error types for event ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading input files.
///
/// Row-level problems always carry the file path and the 1-based line so
/// the operator can fix the source; rows are never dropped.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Required input file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// The csv reader failed.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Required column not found in the header.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    // === Row Errors ===
    /// A cell could not be parsed.
    #[error("invalid {field} value '{value}' in {path} line {line}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// Rows are not sorted by patient then time.
    #[error("rows out of (patient, time) order in {path} at line {line}")]
    Unsorted { path: PathBuf, line: u64 },

    /// A patient appears more than once where one row is expected.
    #[error("duplicate patient '{patient}' in {path} at line {line}")]
    Duplicate {
        patient: String,
        path: PathBuf,
        line: u64,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "CSV file not found: /path/to/file.csv");
    }

    #[test]
    fn test_unsorted_display() {
        let err = IngestError::Unsorted {
            path: PathBuf::from("diagnosis.csv"),
            line: 12,
        };
        assert_eq!(
            err.to_string(),
            "rows out of (patient, time) order in diagnosis.csv at line 12"
        );
    }
}
