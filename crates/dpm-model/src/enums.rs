//! Type-safe enumerations for event sources and time bucketing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Source category of a time-dependent clinical event.
///
/// The declaration order is the stream order used by the merge: diagnosis
/// first, medication last. Ties on `(patient, time)` resolve in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Diagnosis codes (ICD-10), one event per code and diagnosis time.
    Diagnosis,
    /// Number of findings per lab test at a finding time.
    LabTotal,
    /// Number of abnormal findings per lab test at a finding time.
    LabAbnormal,
    /// Medication names at completion time.
    Medication,
}

impl EventCategory {
    /// All categories in stream order.
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Diagnosis,
        EventCategory::LabTotal,
        EventCategory::LabAbnormal,
        EventCategory::Medication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Diagnosis => "diagnosis",
            EventCategory::LabTotal => "lab_total",
            EventCategory::LabAbnormal => "lab_abnormal",
            EventCategory::Medication => "medication",
        }
    }

    /// File stem the ingest layer looks for in an input directory.
    pub fn file_stem(&self) -> &'static str {
        self.as_str()
    }

    /// Prefix applied to codes so that the same lab test code counted as
    /// "total" and as "abnormal" maps to two distinct features.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            EventCategory::LabAbnormal => "@",
            _ => "",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EventCategory::Diagnosis => "Diagnosis codes",
            EventCategory::LabTotal => "Lab test finding counts",
            EventCategory::LabAbnormal => "Lab test abnormal finding counts",
            EventCategory::Medication => "Completed medications",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "diagnosis" | "diag" => Ok(EventCategory::Diagnosis),
            "lab_total" | "labtotal" => Ok(EventCategory::LabTotal),
            "lab_abnormal" | "lababnormal" => Ok(EventCategory::LabAbnormal),
            "medication" | "med" => Ok(EventCategory::Medication),
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}

/// Width of the time bucket that groups events into one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Exact timestamps: only events at the same second share a record.
    #[default]
    Second,
    Minute,
    Hour,
    Day,
}

impl Granularity {
    /// Bucket width in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Granularity::Second => 1,
            Granularity::Minute => 60,
            Granularity::Hour => 3_600,
            Granularity::Day => 86_400,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" | "s" => Ok(Granularity::Second),
            "minute" | "m" => Ok(Granularity::Minute),
            "hour" | "h" => Ok(Granularity::Hour),
            "day" | "d" => Ok(Granularity::Day),
            _ => Err(ModelError::UnknownGranularity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order_matches_stream_order() {
        let mut sorted = EventCategory::ALL;
        sorted.sort();
        assert_eq!(sorted, EventCategory::ALL);
    }

    #[test]
    fn category_parses_aliases() {
        assert_eq!(
            "Lab-Abnormal".parse::<EventCategory>(),
            Ok(EventCategory::LabAbnormal)
        );
        assert_eq!("diag".parse::<EventCategory>(), Ok(EventCategory::Diagnosis));
        assert!("vitals".parse::<EventCategory>().is_err());
    }

    #[test]
    fn only_abnormal_labs_are_prefixed() {
        for category in EventCategory::ALL {
            let expected = matches!(category, EventCategory::LabAbnormal);
            assert_eq!(!category.code_prefix().is_empty(), expected);
        }
    }

    #[test]
    fn granularity_seconds() {
        assert_eq!(Granularity::default().seconds(), 1);
        assert_eq!("day".parse::<Granularity>().map(|g| g.seconds()), Ok(86_400));
        assert!("fortnight".parse::<Granularity>().is_err());
    }
}
