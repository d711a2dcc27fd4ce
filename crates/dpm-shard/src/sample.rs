//! The shard line format.
//!
//! One line per sample. Records are separated by `^B`, fields within a
//! record by `^C`, list items by `^D`; `^A` separates the records from the
//! label part:
//!
//! ```text
//! pidx^C delta^C c1^D c2^C v1^D v2^C age^C gender^C nb ^B ... ^A pidx^B label_delta^B label
//! ```

use std::fmt;

use crate::error::{Result, ShardError};

pub const SAMPLE_SEPARATOR: char = '\u{1}';
pub const RECORD_SEPARATOR: char = '\u{2}';
pub const FIELD_SEPARATOR: char = '\u{3}';
pub const ITEM_SEPARATOR: char = '\u{4}';

const RECORD_FIELDS: usize = 7;

/// All coded values observed for one patient in one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardRecord {
    pub patient: u32,
    /// Seconds since the previous record of the sample; 0 for the first.
    pub delta: i64,
    pub codes: Vec<u32>,
    pub values: Vec<f64>,
    pub age: f64,
    pub gender: String,
}

/// One training sample: the history before a label, and the label.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardSample {
    pub records: Vec<ShardRecord>,
    pub patient: u32,
    /// Seconds from the last record to the label time.
    pub label_delta: i64,
    pub label: f64,
}

impl ShardSample {
    /// Sum of record deltas plus the label delta.
    pub fn time_span(&self) -> i64 {
        self.records.iter().map(|r| r.delta).sum::<i64>() + self.label_delta
    }

    /// Parse one line (with or without the trailing newline).
    ///
    /// `line_no` is only used for error messages.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let malformed = |reason: String| ShardError::MalformedLine {
            line: line_no,
            reason,
        };
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (records_part, label_part) = line
            .split_once(SAMPLE_SEPARATOR)
            .ok_or_else(|| malformed("missing label separator".to_string()))?;

        let label_fields: Vec<&str> = label_part.split(RECORD_SEPARATOR).collect();
        let [patient, label_delta, label] = label_fields.as_slice() else {
            return Err(malformed(format!(
                "expected 3 label fields, found {}",
                label_fields.len()
            )));
        };
        let patient = parse_field::<u32>(patient, "patient index").map_err(malformed)?;
        let label_delta = parse_field::<i64>(label_delta, "label delta").map_err(malformed)?;
        let label = parse_field::<f64>(label, "label").map_err(malformed)?;

        let mut records = Vec::new();
        let mut declared = None;
        for raw in records_part.split(RECORD_SEPARATOR) {
            let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
            if fields.len() != RECORD_FIELDS {
                return Err(malformed(format!(
                    "expected {RECORD_FIELDS} record fields, found {}",
                    fields.len()
                )));
            }
            let codes = parse_list::<u32>(fields[2], "code index").map_err(malformed)?;
            let values = parse_list::<f64>(fields[3], "value").map_err(malformed)?;
            if codes.len() != values.len() {
                return Err(malformed(format!(
                    "{} codes but {} values",
                    codes.len(),
                    values.len()
                )));
            }
            let nb = parse_field::<usize>(fields[6], "record count").map_err(malformed)?;
            if declared.is_some_and(|previous| previous != nb) {
                return Err(malformed("record counts disagree".to_string()));
            }
            declared = Some(nb);
            records.push(ShardRecord {
                patient: parse_field(fields[0], "patient index").map_err(malformed)?,
                delta: parse_field(fields[1], "delta").map_err(malformed)?,
                codes,
                values,
                age: parse_field(fields[4], "age").map_err(malformed)?,
                gender: fields[5].to_string(),
            });
        }
        if declared != Some(records.len()) {
            return Err(malformed(format!(
                "declared {} records, found {}",
                declared.unwrap_or_default(),
                records.len()
            )));
        }

        Ok(Self {
            records,
            patient,
            label_delta,
            label,
        })
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, what: &str) -> std::result::Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {what} '{raw}'"))
}

fn parse_list<T: std::str::FromStr>(raw: &str, what: &str) -> std::result::Result<Vec<T>, String> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(ITEM_SEPARATOR)
        .map(|item| parse_field(item, what))
        .collect()
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{ITEM_SEPARATOR}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Renders the line without the trailing newline.
impl fmt::Display for ShardSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nb = self.records.len();
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                write!(f, "{RECORD_SEPARATOR}")?;
            }
            write!(
                f,
                "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}",
                record.patient, record.delta
            )?;
            write_list(f, &record.codes)?;
            write!(f, "{FIELD_SEPARATOR}")?;
            write_list(f, &record.values)?;
            write!(
                f,
                "{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{nb}",
                record.age, record.gender
            )?;
        }
        write!(
            f,
            "{SAMPLE_SEPARATOR}{}{RECORD_SEPARATOR}{}{RECORD_SEPARATOR}{}",
            self.patient, self.label_delta, self.label
        )
    }
}
