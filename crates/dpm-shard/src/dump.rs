//! JSON-lines dump of merged patient groups.

use std::io::Write;

use serde::Serialize;

use dpm_merge::{GroupSink, PatientGroup};
use dpm_model::{ClinicalEvent, EventCategory, PatientKey, Timestamp};

use crate::error::{Result, ShardError};

#[derive(Debug, Serialize)]
struct DumpEvent<'a> {
    category: EventCategory,
    code: &'a str,
    value: f64,
    time: Timestamp,
}

#[derive(Debug, Serialize)]
struct DumpGroup<'a> {
    patient: &'a PatientKey,
    events: Vec<DumpEvent<'a>>,
}

/// Writes each closed group as one JSON object per line.
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    groups: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, groups: 0 }
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> GroupSink<ClinicalEvent> for JsonLinesWriter<W> {
    type Error = ShardError;

    fn on_patient_group_closed(&mut self, group: PatientGroup<ClinicalEvent>) -> Result<()> {
        let dump = DumpGroup {
            patient: &group.key,
            events: group
                .iter_events()
                .map(|event| DumpEvent {
                    category: event.category,
                    code: &event.code,
                    value: event.value,
                    time: event.time,
                })
                .collect(),
        };
        serde_json::to_writer(&mut self.writer, &dump)?;
        self.writer.write_all(b"\n")?;
        self.groups += 1;
        Ok(())
    }
}
