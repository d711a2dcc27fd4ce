//! Loading per-category event streams.
//!
//! Each category file has the columns `patient`, `code`, `time` and an
//! optional `value`. Rows must already be sorted by `(patient, time)`, as
//! the source queries returned them; unsorted input is an error unless
//! [`IngestOptions::sort_input`] asks for a stable sort instead.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dpm_model::{ClinicalEvent, EventCategory, PatientKey, Timestamp};

use crate::csv_table::{CsvRow, CsvTable, read_csv_table};
use crate::discovery::InputFiles;
use crate::error::{IngestError, Result};

pub(crate) const PATIENT_COLUMNS: [&str; 3] = ["patient", "nric", "patient_id"];
pub(crate) const TIME_COLUMNS: [&str; 3] = ["time", "timestamp", "date"];
const CODE_COLUMNS: [&str; 1] = ["code"];
const VALUE_COLUMNS: [&str; 2] = ["value", "count"];

/// Value used when an event file has no value column.
pub const DEFAULT_EVENT_VALUE: f64 = 1.0;

/// Options for reading event files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Sort rows by `(patient, time)` instead of rejecting unsorted files.
    pub sort_input: bool,
}

impl IngestOptions {
    #[must_use]
    pub fn with_sort_input(mut self, sort_input: bool) -> Self {
        self.sort_input = sort_input;
        self
    }
}

/// The event streams of one input directory, in category order.
#[derive(Debug, Clone, Default)]
pub struct EventStreams {
    pub streams: Vec<(EventCategory, Vec<ClinicalEvent>)>,
}

impl EventStreams {
    pub fn total_events(&self) -> usize {
        self.streams.iter().map(|(_, events)| events.len()).sum()
    }

    pub fn count(&self, category: EventCategory) -> usize {
        self.streams
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, events)| events.len())
    }

    /// Streams as merge sources, dropping the category labels.
    pub fn into_sources(self) -> Vec<Vec<ClinicalEvent>> {
        self.streams.into_iter().map(|(_, events)| events).collect()
    }
}

pub(crate) fn find_column(table: &CsvTable, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| table.column(name))
}

pub(crate) fn require_any_column(table: &CsvTable, names: &[&str]) -> Result<usize> {
    find_column(table, names).ok_or_else(|| IngestError::MissingColumn {
        column: names.join("|"),
        path: table.path.clone(),
    })
}

pub(crate) fn parse_patient(table: &CsvTable, row: &CsvRow, col: usize) -> Result<PatientKey> {
    let raw = row.get(col);
    PatientKey::new(raw).map_err(|e| table.invalid_value(row, "patient", raw, e.to_string()))
}

pub(crate) fn parse_time(table: &CsvTable, row: &CsvRow, col: usize) -> Result<Timestamp> {
    let raw = row.get(col);
    Timestamp::parse(raw).map_err(|e| table.invalid_value(row, "time", raw, e.to_string()))
}

pub(crate) fn parse_number(table: &CsvTable, row: &CsvRow, col: usize, field: &str) -> Result<f64> {
    let raw = row.get(col);
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(table.invalid_value(row, field, raw, "value is not finite")),
        Err(e) => Err(table.invalid_value(row, field, raw, e.to_string())),
    }
}

/// Read one category file into a stream sorted by `(patient, time)`.
pub fn read_event_file(
    path: &Path,
    category: EventCategory,
    options: &IngestOptions,
) -> Result<Vec<ClinicalEvent>> {
    let table = read_csv_table(path)?;
    let patient_col = require_any_column(&table, &PATIENT_COLUMNS)?;
    let code_col = require_any_column(&table, &CODE_COLUMNS)?;
    let time_col = require_any_column(&table, &TIME_COLUMNS)?;
    let value_col = find_column(&table, &VALUE_COLUMNS);

    let mut events: Vec<ClinicalEvent> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let patient = parse_patient(&table, row, patient_col)?;
        let time = parse_time(&table, row, time_col)?;
        let value = match value_col {
            Some(col) => parse_number(&table, row, col, "value")?,
            None => DEFAULT_EVENT_VALUE,
        };
        let code = row.get(code_col);
        let event = ClinicalEvent::new(patient, category, code, value, time)
            .map_err(|e| table.invalid_value(row, "code", code, e.to_string()))?;

        if !options.sort_input
            && let Some(previous) = events.last()
            && (&event.patient, event.time) < (&previous.patient, previous.time)
        {
            return Err(IngestError::Unsorted {
                path: table.path.clone(),
                line: row.line,
            });
        }
        events.push(event);
    }

    if options.sort_input {
        events.sort_by(|a, b| (&a.patient, a.time).cmp(&(&b.patient, b.time)));
    }

    debug!(
        category = %category,
        path = %path.display(),
        events = events.len(),
        "event file loaded"
    );
    Ok(events)
}

/// Load every category stream listed in `files`.
///
/// A category without a file yields an empty stream, which the merge treats
/// as exhausted from the start.
pub fn load_event_streams(files: &InputFiles, options: &IngestOptions) -> Result<EventStreams> {
    let start = Instant::now();
    let mut streams = Vec::with_capacity(EventCategory::ALL.len());
    for category in EventCategory::ALL {
        let events = match files.events.get(&category) {
            Some(path) => read_event_file(path, category, options)?,
            None => {
                warn!(
                    category = %category,
                    expected_file = %format!("{}.csv", category.file_stem()),
                    "no event file for category; stream will be empty"
                );
                Vec::new()
            }
        };
        streams.push((category, events));
    }
    let loaded = EventStreams { streams };
    info!(
        events = loaded.total_events(),
        duration_ms = start.elapsed().as_millis(),
        "event streams loaded"
    );
    Ok(loaded)
}
