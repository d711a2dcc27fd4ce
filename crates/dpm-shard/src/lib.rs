//! Shard generation from merged patient groups.
//!
//! - **Serializer**: streams closed groups into control-character delimited
//!   shard lines, one per labelled sample
//! - **Index tables**: first-seen code and patient indices
//! - **Statistics** and **train/valid/test splits** over shard files
//! - **Manifest**: options, counts and SHA-256 digests of a build
//! - **JSON lines**: plain dump of merged groups

mod dump;
mod error;
mod index;
mod manifest;
mod sample;
mod serializer;
mod split;
mod stats;
mod timeline;

// === Error Types ===
pub use error::{Result, ShardError};

// === Serialization ===
pub use index::FirstSeenIndex;
pub use sample::{
    FIELD_SEPARATOR, ITEM_SEPARATOR, RECORD_SEPARATOR, SAMPLE_SEPARATOR, ShardRecord, ShardSample,
};
pub use serializer::{
    CODE_INDEX_FILE, DEFAULT_MAX_RECORDS, PATIENT_INDEX_FILE, ShardOptions, ShardOutput,
    ShardReport, ShardSerializer,
};
pub use timeline::{PatientTimeline, TimelineRecord};

// === Post-processing ===
pub use manifest::{MANIFEST_FILE, Manifest, ManifestFile, compute_file_digest};
pub use split::{
    SplitOptions, SplitSamples, TEST_FILE, TRAIN_FILE, VALID_FILE, read_shard_lines,
    split_samples, write_split,
};
pub use stats::{ShardStats, read_samples};

// === Merged Dump ===
pub use dump::JsonLinesWriter;
