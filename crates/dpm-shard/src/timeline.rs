//! Per-patient aggregation of events into time-bucketed records.

use dpm_model::{ClinicalEvent, Granularity};

/// Summed values per code within one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRecord {
    /// Start of the bucket, in seconds since the epoch.
    pub time: i64,
    /// `(code index, summed value)` in first-seen order within the bucket.
    pub entries: Vec<(u32, f64)>,
}

impl TimelineRecord {
    fn add(&mut self, code: u32, value: f64) {
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some((_, total)) => *total += value,
            None => self.entries.push((code, value)),
        }
    }
}

/// One patient's events folded into records, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientTimeline {
    pub records: Vec<TimelineRecord>,
}

impl PatientTimeline {
    /// Fold time-ordered events, each paired with its code index, into
    /// buckets of `granularity`.
    pub fn build<'a>(
        events: impl IntoIterator<Item = (u32, &'a ClinicalEvent)>,
        granularity: Granularity,
    ) -> Self {
        let width = granularity.seconds();
        let mut records: Vec<TimelineRecord> = Vec::new();
        for (code, event) in events {
            let time = event.time.bucket(granularity) * width;
            match records.last_mut() {
                Some(last) if last.time == time => last.add(code, event.value),
                _ => {
                    let mut record = TimelineRecord {
                        time,
                        entries: Vec::new(),
                    };
                    record.add(code, event.value);
                    records.push(record);
                }
            }
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_time(&self) -> Option<i64> {
        self.records.last().map(|r| r.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpm_model::{EventCategory, PatientKey, Timestamp};

    fn event(code: &str, value: f64, time: &str) -> ClinicalEvent {
        ClinicalEvent::new(
            PatientKey::new("S1").expect("key"),
            EventCategory::Diagnosis,
            code,
            value,
            Timestamp::parse(time).expect("time"),
        )
        .expect("event")
    }

    fn indexed(events: &[ClinicalEvent]) -> Vec<(u32, &ClinicalEvent)> {
        events
            .iter()
            .map(|e| {
                let code = match e.code.as_str() {
                    "A" => 0,
                    "B" => 1,
                    _ => 2,
                };
                (code, e)
            })
            .collect()
    }

    #[test]
    fn exact_timestamps_form_separate_records() {
        let events = [
            event("A", 1.0, "2012-01-01 08:00:00"),
            event("B", 2.0, "2012-01-01 08:00:00"),
            event("A", 1.0, "2012-01-01 08:00:01"),
        ];
        let timeline = PatientTimeline::build(indexed(&events), Granularity::Second);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.records[0].entries, vec![(0, 1.0), (1, 2.0)]);
        assert_eq!(timeline.records[1].time - timeline.records[0].time, 1);
    }

    #[test]
    fn day_buckets_sum_repeated_codes() {
        let events = [
            event("B", 1.0, "2012-01-01 08:00:00"),
            event("A", 1.0, "2012-01-01 09:30:00"),
            event("B", 3.0, "2012-01-01 23:59:59"),
            event("C", 1.0, "2012-01-02 00:00:00"),
        ];
        let timeline = PatientTimeline::build(indexed(&events), Granularity::Day);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.records[0].entries, vec![(1, 4.0), (0, 1.0)]);
        assert_eq!(
            timeline.records[0].time,
            Timestamp::parse("2012-01-01").expect("day").seconds()
        );
        assert_eq!(timeline.last_time(), Some(timeline.records[0].time + 86_400));
    }
}
