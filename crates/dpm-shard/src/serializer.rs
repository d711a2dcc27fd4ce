//! Streaming shard serializer.
//!
//! Consumes closed patient groups from the merge and writes one shard line
//! per usable label as the group arrives. Code and patient indices are
//! assigned on first observation and kept for the side tables written after
//! the run.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dpm_merge::{GroupSink, PatientGroup};
use dpm_model::{ClinicalEvent, Demographics, Granularity, Label, PatientKey};

use crate::error::{Result, ShardError};
use crate::index::FirstSeenIndex;
use crate::sample::{ShardRecord, ShardSample};
use crate::timeline::PatientTimeline;

pub const CODE_INDEX_FILE: &str = "code_index.csv";
pub const PATIENT_INDEX_FILE: &str = "patient_index.csv";

/// Default cap on records per sample.
pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Options for turning patient groups into samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardOptions {
    /// Width of the bucket that groups events into one record.
    pub granularity: Granularity,
    /// Samples with more records than this are dropped.
    pub max_records: usize,
}

impl Default for ShardOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Second,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl ShardOptions {
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }
}

/// Counts collected while serializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardReport {
    /// Patient groups received.
    pub patients: usize,
    /// Distinct codes indexed.
    pub codes: usize,
    /// Distinct codes that appear in at least one written sample.
    pub codes_in_samples: usize,
    pub labels: usize,
    /// Samples written.
    pub samples: usize,
    /// Labels with no event before the label time.
    pub labels_without_history: usize,
    /// Labels of patients that never appeared in any stream.
    pub labels_without_events: usize,
    /// Samples dropped for exceeding `max_records`.
    pub samples_over_limit: usize,
    /// Largest record count among written samples.
    pub max_records: usize,
}

/// What a finished serializer hands back.
#[derive(Debug)]
pub struct ShardOutput<W> {
    pub writer: W,
    pub report: ShardReport,
    pub codes: FirstSeenIndex<String>,
    pub patients: FirstSeenIndex<PatientKey>,
}

impl<W> ShardOutput<W> {
    /// Write `code_index.csv` and `patient_index.csv` into `dir`.
    pub fn write_index_tables(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let code_path = dir.join(CODE_INDEX_FILE);
        self.codes.write_csv_file(&code_path, "code")?;
        let patient_path = dir.join(PATIENT_INDEX_FILE);
        self.patients.write_csv_file(&patient_path, "patient")?;
        Ok(vec![code_path, patient_path])
    }
}

pub struct ShardSerializer<W: Write> {
    writer: W,
    options: ShardOptions,
    demographics: BTreeMap<PatientKey, Demographics>,
    labels: BTreeMap<PatientKey, Vec<Label>>,
    codes: FirstSeenIndex<String>,
    patients: FirstSeenIndex<PatientKey>,
    sampled_codes: HashSet<u32>,
    report: ShardReport,
}

impl<W: Write> ShardSerializer<W> {
    pub fn new(
        writer: W,
        options: ShardOptions,
        demographics: BTreeMap<PatientKey, Demographics>,
        labels: Vec<Label>,
    ) -> Self {
        let mut by_patient: BTreeMap<PatientKey, Vec<Label>> = BTreeMap::new();
        for label in labels {
            by_patient.entry(label.patient.clone()).or_default().push(label);
        }
        for patient_labels in by_patient.values_mut() {
            patient_labels.sort_by_key(|label| label.time);
        }
        Self {
            writer,
            options,
            demographics,
            labels: by_patient,
            codes: FirstSeenIndex::new(),
            patients: FirstSeenIndex::new(),
            sampled_codes: HashSet::new(),
            report: ShardReport::default(),
        }
    }

    /// Index of `code`, assigning the next index when the code is seen for
    /// the first time.
    pub fn on_first_seen_code(&mut self, code: &str) -> u32 {
        if let Some(index) = self.codes.get(code) {
            return index;
        }
        let (index, _) = self.codes.get_or_insert(&code.to_string());
        debug!(code, index, "code indexed");
        index
    }

    pub fn report(&self) -> &ShardReport {
        &self.report
    }

    fn write_group(&mut self, group: PatientGroup<ClinicalEvent>) -> Result<()> {
        let PatientGroup { key, events } = group;
        let (patient_index, _) = self.patients.get_or_insert(&key);
        self.report.patients += 1;

        let code_indices: Vec<u32> = events
            .iter()
            .map(|emitted| self.on_first_seen_code(&emitted.event.code))
            .collect();

        let Some(labels) = self.labels.remove(&key) else {
            return Ok(());
        };
        for label in labels {
            self.report.labels += 1;
            let cutoff = events.partition_point(|emitted| emitted.event.time < label.time);
            if cutoff == 0 {
                self.report.labels_without_history += 1;
                debug!(patient_index, "label has no prior events; skipped");
                continue;
            }
            let timeline = PatientTimeline::build(
                code_indices[..cutoff]
                    .iter()
                    .copied()
                    .zip(events[..cutoff].iter().map(|emitted| &emitted.event)),
                self.options.granularity,
            );
            let demographics = self
                .demographics
                .get(&key)
                .ok_or(ShardError::MissingDemographics { patient_index })?;
            if timeline.len() > self.options.max_records {
                self.report.samples_over_limit += 1;
                debug!(
                    patient_index,
                    records = timeline.len(),
                    "sample over record limit; dropped"
                );
                continue;
            }
            let sample = build_sample(patient_index, &timeline, demographics, &label);
            writeln!(self.writer, "{sample}")?;
            self.sampled_codes.extend(
                timeline
                    .records
                    .iter()
                    .flat_map(|record| record.entries.iter().map(|(code, _)| *code)),
            );
            self.report.samples += 1;
            self.report.max_records = self.report.max_records.max(timeline.len());
        }
        Ok(())
    }

    /// Flush the writer and return the indices and counts.
    ///
    /// Labels still pending belong to patients that never appeared in any
    /// stream and are counted as labels without events.
    pub fn finish(mut self) -> Result<ShardOutput<W>> {
        self.writer.flush()?;
        let orphaned: usize = self.labels.values().map(Vec::len).sum();
        self.report.labels += orphaned;
        self.report.labels_without_events += orphaned;
        self.report.codes = self.codes.len();
        self.report.codes_in_samples = self.sampled_codes.len();

        if self.report.labels_without_events > 0 {
            warn!(
                labels = self.report.labels_without_events,
                patients = self.labels.len(),
                "labels of patients without events were skipped"
            );
        }

        if self.report.labels_without_history > 0 {
            warn!(
                labels = self.report.labels_without_history,
                "labels without prior events were skipped"
            );
        }
        if self.report.samples_over_limit > 0 {
            warn!(
                samples = self.report.samples_over_limit,
                max_records = self.options.max_records,
                "samples over the record limit were dropped"
            );
        }
        info!(
            patients = self.report.patients,
            codes = self.report.codes,
            codes_in_samples = self.report.codes_in_samples,
            samples = self.report.samples,
            "shard serialization complete"
        );
        Ok(ShardOutput {
            writer: self.writer,
            report: self.report,
            codes: self.codes,
            patients: self.patients,
        })
    }
}

impl<W: Write> GroupSink<ClinicalEvent> for ShardSerializer<W> {
    type Error = ShardError;

    fn on_patient_group_closed(&mut self, group: PatientGroup<ClinicalEvent>) -> Result<()> {
        self.write_group(group)
    }
}

fn build_sample(
    patient: u32,
    timeline: &PatientTimeline,
    demographics: &Demographics,
    label: &Label,
) -> ShardSample {
    let mut previous: Option<i64> = None;
    let records = timeline
        .records
        .iter()
        .map(|record| {
            let delta = previous.map_or(0, |time| record.time - time);
            previous = Some(record.time);
            ShardRecord {
                patient,
                delta,
                codes: record.entries.iter().map(|(code, _)| *code).collect(),
                values: record.entries.iter().map(|(_, value)| *value).collect(),
                age: demographics.age,
                gender: demographics.gender.clone(),
            }
        })
        .collect();
    ShardSample {
        records,
        patient,
        label_delta: previous.map_or(0, |time| label.time.seconds() - time),
        label: label.value,
    }
}
