//! Error types for the merge engine.

use thiserror::Error;

/// Errors that abort a merge run.
///
/// None of these are recoverable: a run that hits one has no consistent
/// partial output.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A stream was advanced after it reported exhaustion.
    #[error("stream {stream} advanced after exhaustion")]
    Precondition { stream: usize },

    /// An event's key or timestamp cannot be ordered.
    #[error("malformed event in stream {stream} at index {index}: {detail}")]
    MalformedEvent {
        stream: usize,
        index: usize,
        detail: String,
    },

    /// The consumer of closed patient groups failed.
    #[error("group sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
