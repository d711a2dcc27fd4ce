use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("patient key must not be empty")]
    EmptyPatientKey,
    #[error("event code must not be empty")]
    EmptyCode,
    #[error("unknown event category: {0}")]
    UnknownCategory(String),
    #[error("unknown granularity: {0}")]
    UnknownGranularity(String),
    #[error("invalid timestamp '{0}' (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
