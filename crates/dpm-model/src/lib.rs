//! Data model for clinical event streams.
//!
//! Events carry a patient key, a timestamp and a coded value. They come from
//! one of four source categories and are merged per patient in
//! `(patient, time)` order by `dpm-merge`.

pub mod enums;
pub mod error;
pub mod event;
pub mod ids;
pub mod subject;

pub use enums::{EventCategory, Granularity};
pub use error::{ModelError, Result};
pub use event::{ClinicalEvent, Timestamp};
pub use ids::PatientKey;
pub use subject::{Demographics, Label};
