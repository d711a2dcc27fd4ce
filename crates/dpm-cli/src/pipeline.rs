//! Build pipeline with explicit stages.
//!
//! 1. **Ingest**: discover and read the category CSVs, demographics, labels
//! 2. **Merge**: k-way merge of the category streams into patient groups
//! 3. **Serialize**: write `shard_input` and the index side tables
//! 4. **Split**: shuffle samples into train / valid / test shards
//! 5. **Manifest**: record options, counts and file digests
//!
//! Each stage takes the output of the previous stage and returns typed results.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn};

use dpm_ingest::{
    EventStreams, IngestOptions, InputFiles, discover_input_files, load_event_streams,
    read_demographics, read_labels,
};
use dpm_merge::{MergeEngine, MergeSummary};
use dpm_model::{Demographics, Label, PatientKey};
use dpm_shard::{
    JsonLinesWriter, MANIFEST_FILE, Manifest, ShardOptions, ShardReport, ShardSerializer,
    ShardStats, SplitOptions, read_shard_lines, split_samples, write_split,
};

use crate::logging::redact_value;
use crate::types::{
    BuildConfig, BuildCounts, BuildResult, ManifestOptions, MergeResult, SplitCounts,
};

/// File name of the full shard written by `build`.
pub const SHARD_FILE: &str = "shard_input";

// ============================================================================
// Stage 1: Ingest
// ============================================================================

#[derive(Debug)]
pub struct IngestResult {
    pub files: InputFiles,
    pub streams: EventStreams,
    pub demographics: BTreeMap<PatientKey, Demographics>,
    pub labels: Vec<Label>,
}

/// Read every input of `input_dir`.
///
/// Missing demographics or labels files are tolerated with a warning; the
/// shard will then hold no samples.
pub fn ingest(input_dir: &Path, options: &IngestOptions) -> Result<IngestResult> {
    let files = discover_input_files(input_dir)
        .with_context(|| format!("discover inputs in {}", input_dir.display()))?;
    let streams = load_event_streams(&files, options).context("load event streams")?;

    let demographics = match &files.demographics {
        Some(path) => read_demographics(path).context("read demographics")?,
        None => {
            warn!(dir = %input_dir.display(), "no demographics.csv found");
            BTreeMap::new()
        }
    };
    let labels = match &files.labels {
        Some(path) => read_labels(path).context("read labels")?,
        None => {
            warn!(dir = %input_dir.display(), "no labels.csv found; no samples will be written");
            Vec::new()
        }
    };

    let mut unmatched = 0usize;
    let mut previous: Option<&PatientKey> = None;
    for label in &labels {
        if previous == Some(&label.patient) {
            continue;
        }
        previous = Some(&label.patient);
        if !demographics.contains_key(&label.patient) {
            unmatched += 1;
            debug!(
                patient = %redact_value(label.patient.as_str()),
                "labelled patient has no demographics"
            );
        }
    }
    if unmatched > 0 {
        warn!(
            patients = unmatched,
            "labelled patients without demographics; their samples will fail serialization"
        );
    }

    Ok(IngestResult {
        files,
        streams,
        demographics,
        labels,
    })
}

// ============================================================================
// Stages 2-3: Merge and serialize
// ============================================================================

#[derive(Debug)]
pub struct SerializeResult {
    pub merge: MergeSummary,
    pub report: ShardReport,
    pub shard_path: PathBuf,
    pub index_tables: Vec<PathBuf>,
}

/// Merge the category streams and stream each patient group into the shard.
pub fn serialize(
    ingested: IngestResult,
    options: &ShardOptions,
    output_dir: &Path,
) -> Result<SerializeResult> {
    let shard_path = output_dir.join(SHARD_FILE);
    let file = File::create(&shard_path)
        .with_context(|| format!("create {}", shard_path.display()))?;

    let mut serializer = ShardSerializer::new(
        BufWriter::new(file),
        options.clone(),
        ingested.demographics,
        ingested.labels,
    );
    let sources = ingested.streams.into_sources();
    let merge = info_span!("merge", streams = sources.len()).in_scope(|| {
        MergeEngine::new(sources)
            .context("initialize merge")?
            .run(&mut serializer)
            .context("merge event streams")
    })?;
    let output = serializer.finish().context("finish shard")?;
    let index_tables = output
        .write_index_tables(output_dir)
        .context("write index tables")?;

    Ok(SerializeResult {
        merge,
        report: output.report,
        shard_path,
        index_tables,
    })
}

// ============================================================================
// Stage 4: Split
// ============================================================================

#[derive(Debug)]
pub struct SplitResult {
    pub counts: SplitCounts,
    pub files: Vec<PathBuf>,
}

/// Shuffle the samples of `shard_path` into train / valid / test files.
pub fn split(shard_path: &Path, output_dir: &Path, options: &SplitOptions) -> Result<SplitResult> {
    let lines = read_shard_lines(shard_path)
        .with_context(|| format!("read {}", shard_path.display()))?;
    let parts = split_samples(lines, options).context("split samples")?;
    let files = write_split(output_dir, &parts).context("write split files")?;
    Ok(SplitResult {
        counts: SplitCounts {
            train: parts.train.len(),
            valid: parts.valid.len(),
            test: parts.test.len(),
        },
        files,
    })
}

// ============================================================================
// Stage 5: Manifest
// ============================================================================

pub fn write_manifest(
    output_dir: &Path,
    options: &ManifestOptions,
    counts: &BuildCounts,
    files: &[PathBuf],
) -> Result<PathBuf> {
    let mut manifest = Manifest::new(
        serde_json::to_value(options).context("encode options")?,
        serde_json::to_value(counts).context("encode counts")?,
    );
    for path in files {
        manifest
            .add_file(output_dir, path)
            .with_context(|| format!("digest {}", path.display()))?;
    }
    let manifest_path = output_dir.join(MANIFEST_FILE);
    manifest
        .write(&manifest_path)
        .with_context(|| format!("write {}", manifest_path.display()))?;
    Ok(manifest_path)
}

// ============================================================================
// Commands
// ============================================================================

/// Run every stage of `build`.
pub fn run_build(config: &BuildConfig) -> Result<BuildResult> {
    if let Some(split_options) = &config.split {
        split_options.validate()?;
    }
    let build_span = info_span!("build", input_dir = %config.input_dir.display());
    let _build_guard = build_span.enter();
    let start = Instant::now();

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("create {}", config.output_dir.display()))?;

    let ingested = info_span!("ingest").in_scope(|| ingest(&config.input_dir, &config.ingest))?;
    let categories: Vec<_> = ingested
        .streams
        .streams
        .iter()
        .map(|(category, events)| (*category, events.len()))
        .collect();

    let serialize_start = Instant::now();
    let serialized = info_span!("shard")
        .in_scope(|| serialize(ingested, &config.shard, &config.output_dir))?;
    info!(
        events = serialized.merge.events,
        groups = serialized.merge.groups,
        samples = serialized.report.samples,
        duration_ms = serialize_start.elapsed().as_millis(),
        "shard written"
    );

    let stats = ShardStats::from_path(&serialized.shard_path).context("compute shard statistics")?;

    let mut files = vec![serialized.shard_path.clone()];
    files.extend(serialized.index_tables.iter().cloned());

    let split_counts = match &config.split {
        Some(options) => {
            let result = info_span!("split")
                .in_scope(|| split(&serialized.shard_path, &config.output_dir, options))?;
            files.extend(result.files);
            Some(result.counts)
        }
        None => None,
    };

    let manifest_options = ManifestOptions {
        ingest: config.ingest.clone(),
        shard: config.shard.clone(),
        split: config.split.clone(),
    };
    let counts = BuildCounts {
        events: serialized.merge.events,
        groups: serialized.merge.groups,
        report: serialized.report.clone(),
        stats: stats.clone(),
    };
    let manifest_path = write_manifest(&config.output_dir, &manifest_options, &counts, &files)?;

    info!(
        output_dir = %config.output_dir.display(),
        files = files.len() + 1,
        duration_ms = start.elapsed().as_millis(),
        "build complete"
    );

    Ok(BuildResult {
        input_dir: config.input_dir.clone(),
        output_dir: config.output_dir.clone(),
        categories,
        merge: serialized.merge,
        report: serialized.report,
        stats,
        split: split_counts,
        shard_path: serialized.shard_path,
        manifest_path,
        files,
    })
}

/// Merge the category streams of `input_dir` into JSON lines at `output`.
pub fn run_merge(input_dir: &Path, output: &Path, options: &IngestOptions) -> Result<MergeResult> {
    let merge_span = info_span!("merge", input_dir = %input_dir.display());
    let _merge_guard = merge_span.enter();
    let start = Instant::now();

    let files = discover_input_files(input_dir)
        .with_context(|| format!("discover inputs in {}", input_dir.display()))?;
    let streams = load_event_streams(&files, options).context("load event streams")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(output).with_context(|| format!("create {}", output.display()))?;
    let mut writer = JsonLinesWriter::new(BufWriter::new(file));
    let summary = MergeEngine::new(streams.into_sources())
        .context("initialize merge")?
        .run(&mut writer)
        .context("merge event streams")?;
    writer.finish().context("flush merged output")?;

    info!(
        events = summary.events,
        groups = summary.groups,
        duration_ms = start.elapsed().as_millis(),
        "merged groups written"
    );
    Ok(MergeResult {
        output: output.to_path_buf(),
        events: summary.events,
        groups: summary.groups,
    })
}
