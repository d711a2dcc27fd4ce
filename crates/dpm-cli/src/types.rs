use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use dpm_ingest::IngestOptions;
use dpm_merge::MergeSummary;
use dpm_model::EventCategory;
use dpm_shard::{ShardOptions, ShardReport, ShardStats, SplitOptions};

/// Everything `build` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ingest: IngestOptions,
    pub shard: ShardOptions,
    /// `None` skips the train/valid/test split.
    pub split: Option<SplitOptions>,
}

/// Options recorded in the manifest; paths are left out so the manifest
/// only depends on the data and the settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestOptions {
    pub ingest: IngestOptions,
    pub shard: ShardOptions,
    pub split: Option<SplitOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCounts {
    pub events: usize,
    pub groups: usize,
    pub report: ShardReport,
    pub stats: ShardStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCounts {
    pub train: usize,
    pub valid: usize,
    pub test: usize,
}

#[derive(Debug)]
pub struct BuildResult {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Events read per category, in stream order.
    pub categories: Vec<(EventCategory, usize)>,
    pub merge: MergeSummary,
    pub report: ShardReport,
    pub stats: ShardStats,
    pub split: Option<SplitCounts>,
    pub shard_path: PathBuf,
    pub manifest_path: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct MergeResult {
    pub output: PathBuf,
    pub events: usize,
    pub groups: usize,
}
