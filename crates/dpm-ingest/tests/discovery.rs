//! Tests for input file discovery.

use std::fs;
use std::path::Path;

use dpm_ingest::{IngestError, discover_input_files, list_csv_files};
use dpm_model::EventCategory;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "patient,code,time\n").expect("write file");
}

#[test]
fn discovers_categories_and_side_tables() {
    let dir = tempfile::tempdir().expect("temp dir");
    touch(dir.path(), "Diagnosis.csv");
    touch(dir.path(), "lab_total.CSV");
    touch(dir.path(), "medication.csv");
    touch(dir.path(), "demographics.csv");
    touch(dir.path(), "labels.csv");
    touch(dir.path(), "notes.csv");
    touch(dir.path(), "lab_abnormal.txt");
    fs::create_dir(dir.path().join("lab_abnormal.csv")).expect("decoy dir");

    let files = discover_input_files(dir.path()).expect("discover");

    assert_eq!(files.events.len(), 3);
    assert!(files.events.contains_key(&EventCategory::Diagnosis));
    assert!(files.events.contains_key(&EventCategory::LabTotal));
    assert!(files.events.contains_key(&EventCategory::Medication));
    assert_eq!(files.missing_categories(), vec![EventCategory::LabAbnormal]);
    assert!(files.demographics.is_some());
    assert!(files.labels.is_some());
}

#[test]
fn lists_csv_files_sorted() {
    let dir = tempfile::tempdir().expect("temp dir");
    touch(dir.path(), "b.csv");
    touch(dir.path(), "a.csv");
    touch(dir.path(), "c.json");

    let files = list_csv_files(dir.path()).expect("list");
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["a.csv", "b.csv"]);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope");
    let err = discover_input_files(&missing).expect_err("missing dir");
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}
