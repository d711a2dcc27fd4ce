#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// Opaque patient identifier used as the merge key (NRIC in the source data).
///
/// Ordering is plain byte-wise string ordering, which is what the source
/// queries sorted by.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PatientKey(String);

impl PatientKey {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyPatientKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PatientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
