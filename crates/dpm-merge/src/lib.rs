//! Streaming k-way merge of per-patient event streams.
//!
//! Each input stream is sorted by `(patient, time)`. The merge interleaves
//! them into one stream in the same order and partitions it into patient
//! groups, handing each closed group to a [`GroupSink`].
//!
//! # Example
//!
//! ```ignore
//! use dpm_merge::MergeEngine;
//!
//! let engine = MergeEngine::new([diagnoses, lab_total, lab_abnormal, medications])?;
//! let summary = engine.run(&mut serializer)?;
//! ```

mod engine;
mod error;
mod group;
mod record;
mod sink;
mod stream;

pub use engine::{MergeEngine, MergeStep, MergeSummary};
pub use error::{MergeError, Result};
pub use group::{Emitted, PatientGroup};
pub use record::MergeRecord;
pub use sink::GroupSink;
pub use stream::SortedStream;
