use serde::{Deserialize, Serialize};

use crate::{PatientKey, Timestamp};

/// Time-independent patient features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: f64,
    /// Gender code as recorded at the source.
    pub gender: String,
}

/// A prediction target observed for a patient at a point in time.
///
/// Every label becomes at most one sample: the patient's records strictly
/// before `time` form the input, `value` the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub patient: PatientKey,
    pub value: f64,
    pub time: Timestamp,
}
