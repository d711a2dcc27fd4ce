use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info_span;

use dpm_cli::pipeline::{run_build as build_pipeline, run_merge as merge_pipeline, split};
use dpm_cli::types::{BuildConfig, BuildResult, MergeResult, SplitCounts};
use dpm_ingest::IngestOptions;
use dpm_model::EventCategory;
use dpm_shard::{ShardOptions, ShardStats, SplitOptions};

use crate::cli::{BuildArgs, IngestArgs, MergeArgs, RatioArgs, SplitArgs, StatsArgs};
use crate::summary::apply_table_style;

fn ingest_options(args: &IngestArgs) -> IngestOptions {
    IngestOptions::default().with_sort_input(args.sort_input)
}

fn split_options(args: &RatioArgs) -> SplitOptions {
    SplitOptions::default()
        .with_train_ratio(args.train_ratio)
        .with_valid_ratio(args.valid_ratio)
        .with_seed(args.seed)
}

pub fn build_config(args: &BuildArgs) -> BuildConfig {
    BuildConfig {
        input_dir: args.input_dir.clone(),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| args.input_dir.join("output")),
        ingest: ingest_options(&args.ingest),
        shard: ShardOptions::default()
            .with_granularity(args.granularity.into())
            .with_max_records(args.max_records),
        split: (!args.no_split).then(|| split_options(&args.ratios)),
    }
}

pub fn run_build(args: &BuildArgs) -> Result<BuildResult> {
    build_pipeline(&build_config(args))
}

pub fn run_merge(args: &MergeArgs) -> Result<MergeResult> {
    merge_pipeline(&args.input_dir, &args.output, &ingest_options(&args.ingest))
}

pub fn run_split(args: &SplitArgs) -> Result<(PathBuf, SplitCounts)> {
    let options = split_options(&args.ratios);
    options.validate()?;
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => args
            .shard_file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let result = info_span!("split", shard = %args.shard_file.display())
        .in_scope(|| split(&args.shard_file, &output_dir, &options))?;
    Ok((output_dir, result.counts))
}

pub fn run_stats(args: &StatsArgs) -> Result<ShardStats> {
    ShardStats::from_path(&args.shard_file)
        .with_context(|| format!("read {}", args.shard_file.display()))
}

pub fn run_categories() {
    let mut table = Table::new();
    table.set_header(vec!["Stream", "Category", "File", "Code prefix", "Description"]);
    apply_table_style(&mut table);
    for (index, category) in EventCategory::ALL.into_iter().enumerate() {
        let prefix = match category.code_prefix() {
            "" => "-",
            prefix => prefix,
        };
        table.add_row(vec![
            index.to_string(),
            category.as_str().to_string(),
            format!("{}.csv", category.file_stem()),
            prefix.to_string(),
            category.description().to_string(),
        ]);
    }
    println!("{table}");
}
