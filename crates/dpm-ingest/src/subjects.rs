//! Demographics and label side tables.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;

use tracing::debug;

use dpm_model::{Demographics, Label, PatientKey};

use crate::csv_table::read_csv_table;
use crate::error::{IngestError, Result};
use crate::events::{
    PATIENT_COLUMNS, TIME_COLUMNS, parse_number, parse_patient, parse_time, require_any_column,
};

/// Read `patient,age,gender` rows keyed by patient.
pub fn read_demographics(path: &Path) -> Result<BTreeMap<PatientKey, Demographics>> {
    let table = read_csv_table(path)?;
    let patient_col = require_any_column(&table, &PATIENT_COLUMNS)?;
    let age_col = table.require_column("age")?;
    let gender_col = require_any_column(&table, &["gender", "sex"])?;

    let mut demographics = BTreeMap::new();
    for row in &table.rows {
        let patient = parse_patient(&table, row, patient_col)?;
        let age = parse_number(&table, row, age_col, "age")?;
        let gender = row.get(gender_col);
        if gender.is_empty() {
            return Err(table.invalid_value(row, "gender", gender, "gender is empty"));
        }
        match demographics.entry(patient) {
            Entry::Vacant(slot) => {
                slot.insert(Demographics {
                    age,
                    gender: gender.to_string(),
                });
            }
            Entry::Occupied(slot) => {
                return Err(IngestError::Duplicate {
                    patient: slot.key().to_string(),
                    path: table.path.clone(),
                    line: row.line,
                });
            }
        }
    }
    debug!(
        path = %path.display(),
        patients = demographics.len(),
        "demographics loaded"
    );
    Ok(demographics)
}

/// Read `patient,value,time` label rows, sorted by patient then time.
pub fn read_labels(path: &Path) -> Result<Vec<Label>> {
    let table = read_csv_table(path)?;
    let patient_col = require_any_column(&table, &PATIENT_COLUMNS)?;
    let value_col = require_any_column(&table, &["value", "label"])?;
    let time_col = require_any_column(&table, &TIME_COLUMNS)?;

    let mut labels = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        labels.push(Label {
            patient: parse_patient(&table, row, patient_col)?,
            value: parse_number(&table, row, value_col, "value")?,
            time: parse_time(&table, row, time_col)?,
        });
    }
    labels.sort_by(|a, b| (&a.patient, a.time).cmp(&(&b.patient, b.time)));
    debug!(path = %path.display(), labels = labels.len(), "labels loaded");
    Ok(labels)
}
