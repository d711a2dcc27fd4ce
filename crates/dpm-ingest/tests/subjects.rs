use std::fs;

use dpm_ingest::{IngestError, read_demographics, read_labels};
use dpm_model::PatientKey;

#[test]
fn reads_demographics_by_patient() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("demographics.csv");
    fs::write(&path, "patient,age,gender\nS2,61,F\nS1,54.5,M\n").expect("write");

    let demographics = read_demographics(&path).expect("read");
    let s1 = demographics
        .get(&PatientKey::new("S1").expect("key"))
        .expect("S1 present");
    assert!((s1.age - 54.5).abs() < f64::EPSILON);
    assert_eq!(s1.gender, "M");
    assert_eq!(demographics.len(), 2);
}

#[test]
fn duplicate_demographics_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("demographics.csv");
    fs::write(&path, "patient,age,gender\nS1,61,F\nS1,62,F\n").expect("write");

    let err = read_demographics(&path).expect_err("duplicate");
    assert!(matches!(err, IngestError::Duplicate { line: 3, .. }));
}

#[test]
fn labels_are_sorted_by_patient_and_time() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("labels.csv");
    fs::write(
        &path,
        "patient,value,time\nS2,40,2013-01-01\nS1,35.5,2013-06-01\nS1,41,2013-02-01\n",
    )
    .expect("write");

    let labels = read_labels(&path).expect("read");
    let order: Vec<_> = labels
        .iter()
        .map(|l| (l.patient.as_str(), l.value))
        .collect();
    assert_eq!(order, vec![("S1", 41.0), ("S1", 35.5), ("S2", 40.0)]);
}

#[test]
fn empty_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("labels.csv");
    fs::write(&path, "\n\n").expect("write");
    assert!(matches!(read_labels(&path), Err(IngestError::EmptyCsv { .. })));
}
