//! Event ingestion utilities.
//!
//! Reads the CSV exports that feed the merge: one file per event category,
//! plus demographics and labels.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use dpm_ingest::{IngestOptions, discover_input_files, load_event_streams};
//!
//! let files = discover_input_files(Path::new("export/"))?;
//! let streams = load_event_streams(&files, &IngestOptions::default())?;
//! ```

mod csv_table;
mod discovery;
mod error;
mod events;
mod subjects;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv_table::{CsvRow, CsvTable, read_csv_table};

// === File Discovery ===
pub use discovery::{
    DEMOGRAPHICS_STEM, InputFiles, LABELS_STEM, discover_input_files, list_csv_files,
};

// === Event Streams ===
pub use events::{
    DEFAULT_EVENT_VALUE, EventStreams, IngestOptions, load_event_streams, read_event_file,
};

// === Side Tables ===
pub use subjects::{read_demographics, read_labels};
