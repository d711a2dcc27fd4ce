//! Tests for dpm-model types.

use dpm_model::{ClinicalEvent, EventCategory, Label, PatientKey, Timestamp};

#[test]
fn patient_key_is_trimmed_and_non_empty() {
    let key = PatientKey::new("  S0001 ").expect("key");
    assert_eq!(key.as_str(), "S0001");
    assert!(PatientKey::new("   ").is_err());
}

#[test]
fn patient_keys_order_lexicographically() {
    let a = PatientKey::new("S10").expect("key");
    let b = PatientKey::new("S9").expect("key");
    assert!(a < b);
}

#[test]
fn event_serializes_with_readable_time() {
    let event = ClinicalEvent::new(
        PatientKey::new("S0001").expect("key"),
        EventCategory::LabTotal,
        "HBA1C",
        3.0,
        Timestamp::parse("2013-05-02 10:00:00").expect("time"),
    )
    .expect("event");

    let json = serde_json::to_value(&event).expect("serialize event");
    assert_eq!(json["patient"], "S0001");
    assert_eq!(json["category"], "lab_total");
    assert_eq!(json["time"], "2013-05-02 10:00:00");

    let round: ClinicalEvent = serde_json::from_value(json).expect("deserialize event");
    assert_eq!(round, event);
}

#[test]
fn label_rejects_malformed_time() {
    let json = r#"{"patient":"S1","value":42.5,"time":"yesterday"}"#;
    let result: Result<Label, _> = serde_json::from_str(json);
    assert!(result.is_err());
}
