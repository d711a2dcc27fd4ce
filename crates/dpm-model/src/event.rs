use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{EventCategory, Granularity, ModelError, PatientKey};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Seconds since the Unix epoch, read as naive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    pub const fn seconds(&self) -> i64 {
        self.0
    }

    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self(value.and_utc().timestamp())
    }

    /// Parse `YYYY-MM-DD HH:MM:SS`, the same with a `T` separator, or a bare
    /// date (midnight).
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        for format in DATETIME_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::from_naive(value));
            }
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(|date| Self::from_naive(date.and_time(NaiveTime::MIN)))
            .map_err(|_| ModelError::InvalidTimestamp(raw.to_string()))
    }

    /// Index of the bucket this timestamp falls into.
    pub fn bucket(&self, granularity: Granularity) -> i64 {
        self.0.div_euclid(granularity.seconds())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(self.0, 0) {
            Some(value) => write!(f, "{}", value.naive_utc().format(DATETIME_FORMATS[0])),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// One observation for one patient at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEvent {
    pub patient: PatientKey,
    pub category: EventCategory,
    /// Feature code with the category prefix already applied.
    pub code: String,
    pub value: f64,
    pub time: Timestamp,
}

impl ClinicalEvent {
    pub fn new(
        patient: PatientKey,
        category: EventCategory,
        code: &str,
        value: f64,
        time: Timestamp,
    ) -> Result<Self, ModelError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ModelError::EmptyCode);
        }
        Ok(Self {
            patient,
            category,
            code: format!("{}{}", category.code_prefix(), code),
            value,
            time,
        })
    }
}
