//! End-to-end tests: merge four category streams and serialize the groups.

use std::collections::BTreeMap;
use std::fs;

use dpm_merge::{MergeEngine, MergeError};
use dpm_model::{
    ClinicalEvent, Demographics, EventCategory, Granularity, Label, PatientKey, Timestamp,
};
use dpm_shard::{
    CODE_INDEX_FILE, FIELD_SEPARATOR, ITEM_SEPARATOR, PATIENT_INDEX_FILE, RECORD_SEPARATOR,
    SAMPLE_SEPARATOR, ShardError, ShardOptions, ShardOutput, ShardReport, ShardSample,
    ShardSerializer, ShardStats, SplitOptions, read_shard_lines, split_samples, write_split,
};

fn key(patient: &str) -> PatientKey {
    PatientKey::new(patient).expect("key")
}

fn event(
    patient: &str,
    category: EventCategory,
    code: &str,
    value: f64,
    time: &str,
) -> ClinicalEvent {
    ClinicalEvent::new(
        key(patient),
        category,
        code,
        value,
        Timestamp::parse(time).expect("time"),
    )
    .expect("event")
}

fn label(patient: &str, value: f64, time: &str) -> Label {
    Label {
        patient: key(patient),
        value,
        time: Timestamp::parse(time).expect("time"),
    }
}

fn streams() -> Vec<Vec<ClinicalEvent>> {
    use EventCategory::{Diagnosis, LabAbnormal, LabTotal, Medication};
    vec![
        vec![
            event("S1", Diagnosis, "E11", 1.0, "2012-01-01 08:00:00"),
            event("S2", Diagnosis, "I10", 1.0, "2012-01-05 00:00:00"),
        ],
        vec![
            event("S1", LabTotal, "HBA1C", 2.0, "2012-01-01 08:00:00"),
            event("S1", LabTotal, "HBA1C", 1.0, "2012-01-03 00:00:00"),
        ],
        vec![event("S1", LabAbnormal, "HBA1C", 1.0, "2012-01-01 08:00:00")],
        vec![
            event("S1", Medication, "M1", 1.0, "2012-01-04 00:00:00"),
            event("S3", Medication, "M2", 1.0, "2012-02-01 00:00:00"),
        ],
    ]
}

fn demographics() -> BTreeMap<PatientKey, Demographics> {
    BTreeMap::from([
        (
            key("S1"),
            Demographics {
                age: 54.0,
                gender: "M".to_string(),
            },
        ),
        (
            key("S2"),
            Demographics {
                age: 61.5,
                gender: "F".to_string(),
            },
        ),
    ])
}

fn labels() -> Vec<Label> {
    vec![
        label("S2", 8.0, "2012-01-06 00:00:00"),
        label("S1", 7.5, "2012-01-03 12:00:00"),
        label("S1", 6.0, "2012-01-01 08:00:00"),
        label("S4", 5.0, "2012-01-01 00:00:00"),
    ]
}

fn run(
    options: ShardOptions,
    demographics: BTreeMap<PatientKey, Demographics>,
) -> Result<ShardOutput<Vec<u8>>, MergeError> {
    let mut serializer = ShardSerializer::new(Vec::new(), options, demographics, labels());
    MergeEngine::new(streams())?.run(&mut serializer)?;
    Ok(serializer.finish().expect("finish"))
}

fn readable(raw: &str) -> String {
    raw.replace(SAMPLE_SEPARATOR, " | ")
        .replace(RECORD_SEPARATOR, " / ")
        .replace(FIELD_SEPARATOR, ",")
        .replace(ITEM_SEPARATOR, ";")
}

#[test]
fn serializes_samples_in_merge_order() {
    let output = run(ShardOptions::default(), demographics()).expect("run");
    let text = String::from_utf8(output.writer.clone()).expect("utf8");

    insta::assert_snapshot!(readable(text.trim_end()), @r"
    0,0,0;1;2,1;2;1,54,M,2 / 0,144000,1,1,54,M,2 | 0 / 43200 / 7.5
    1,0,4,1,61.5,F,1 | 1 / 86400 / 8
    ");

    assert_eq!(
        output.report,
        ShardReport {
            patients: 3,
            codes: 6,
            codes_in_samples: 4,
            labels: 4,
            samples: 2,
            labels_without_history: 1,
            labels_without_events: 1,
            samples_over_limit: 0,
            max_records: 2,
        }
    );

    let codes: Vec<_> = output.codes.iter().map(|(code, _)| code.as_str()).collect();
    assert_eq!(codes, vec!["E11", "HBA1C", "@HBA1C", "M1", "I10", "M2"]);
    assert_eq!(output.patients.get(&key("S3")), Some(2));

    let first = ShardSample::parse(text.lines().next().expect("line"), 1).expect("parse");
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.time_span(), 144_000 + 43_200);
}

#[test]
fn labels_of_unknown_patients_are_counted_apart() {
    let labels = vec![
        label("S9", 1.0, "2012-01-01 00:00:00"),
        label("S9", 2.0, "2012-03-01 00:00:00"),
        label("S2", 3.0, "2012-01-01 00:00:00"),
    ];
    let mut serializer =
        ShardSerializer::new(Vec::new(), ShardOptions::default(), demographics(), labels);
    MergeEngine::new(streams())
        .expect("engine")
        .run(&mut serializer)
        .expect("merge");
    let report = serializer.finish().expect("finish").report;

    assert_eq!(report.labels, 3);
    assert_eq!(report.samples, 0);
    assert_eq!(report.labels_without_events, 2);
    assert_eq!(report.labels_without_history, 1);
    assert_eq!(report.codes_in_samples, 0);
}

#[test]
fn index_tables_match_shard_indices() {
    let output = run(ShardOptions::default(), demographics()).expect("run");
    let dir = tempfile::tempdir().expect("temp dir");
    let written = output.write_index_tables(dir.path()).expect("tables");
    assert_eq!(written.len(), 2);

    let codes = fs::read_to_string(dir.path().join(CODE_INDEX_FILE)).expect("codes");
    assert_eq!(
        codes,
        "code,index\nE11,0\nHBA1C,1\n@HBA1C,2\nM1,3\nI10,4\nM2,5\n"
    );
    let patients = fs::read_to_string(dir.path().join(PATIENT_INDEX_FILE)).expect("patients");
    assert_eq!(patients, "patient,index\nS1,0\nS2,1\nS3,2\n");
}

#[test]
fn record_limit_and_granularity_apply() {
    let options = ShardOptions::default()
        .with_granularity(Granularity::Day)
        .with_max_records(1);
    let output = run(options, demographics()).expect("run");
    assert_eq!(output.report.samples, 1);
    assert_eq!(output.report.samples_over_limit, 1);

    let options = ShardOptions::default().with_granularity(Granularity::Day);
    let output = run(options, demographics()).expect("run");
    let text = String::from_utf8(output.writer).expect("utf8");
    let first = ShardSample::parse(text.lines().next().expect("line"), 1).expect("parse");
    assert_eq!(first.records[1].delta, 2 * 86_400);
    assert_eq!(first.label_delta, 12 * 3_600);
}

#[test]
fn missing_demographics_fails_the_run() {
    let mut partial = demographics();
    partial.remove(&key("S2"));

    let err = run(ShardOptions::default(), partial).expect_err("missing demographics");
    match err {
        MergeError::Sink(source) => assert!(matches!(
            source.downcast_ref::<ShardError>(),
            Some(ShardError::MissingDemographics { patient_index: 1 })
        )),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn stats_and_split_over_written_shard() {
    let output = run(ShardOptions::default(), demographics()).expect("run");
    let dir = tempfile::tempdir().expect("temp dir");
    let shard_path = dir.path().join("shard_input");
    fs::write(&shard_path, &output.writer).expect("write shard");

    let stats = ShardStats::from_path(&shard_path).expect("stats");
    assert_eq!(stats.samples, 2);
    assert_eq!(stats.patients, 2);
    assert_eq!(stats.max_records, 2);
    assert!((stats.average_time_span - (187_200.0 + 86_400.0) / 2.0).abs() < 1e-9);

    let lines = read_shard_lines(&shard_path).expect("lines");
    let split = split_samples(lines, &SplitOptions::default().with_seed(Some(7))).expect("split");
    assert_eq!(split.train.len(), 1);
    assert_eq!(split.test.len(), 1);

    let written = write_split(dir.path(), &split).expect("write split");
    assert_eq!(written.len(), 3);
    let valid = fs::read_to_string(&written[1]).expect("valid");
    assert!(valid.is_empty());
}
