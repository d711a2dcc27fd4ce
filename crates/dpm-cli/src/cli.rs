//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dpm_model::Granularity;
use dpm_shard::DEFAULT_MAX_RECORDS;

#[derive(Parser)]
#[command(
    name = "dpm",
    version,
    about = "Merge per-category clinical event exports into training shards",
    long_about = "Merge per-category clinical event exports into training shards.\n\n\
                  Reads diagnosis, lab and medication CSVs sorted by patient and time,\n\
                  merges them per patient, and writes control-character delimited\n\
                  samples for every label together with code and patient index tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest, merge and serialize an export folder into shards.
    Build(BuildArgs),

    /// Write merged patient groups as JSON lines.
    Merge(MergeArgs),

    /// Split an existing shard file into train / valid / test shards.
    Split(SplitArgs),

    /// Print statistics of a shard file.
    Stats(StatsArgs),

    /// List event categories and the file names they are read from.
    Categories,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Sort each category file by patient and time instead of rejecting
    /// unsorted input.
    #[arg(long = "sort-input")]
    pub sort_input: bool,
}

#[derive(Args)]
pub struct RatioArgs {
    /// Share of samples written to train.shard.
    #[arg(long = "train-ratio", default_value_t = 0.9)]
    pub train_ratio: f64,

    /// Share of samples written to valid.shard.
    #[arg(long = "valid-ratio", default_value_t = 0.0)]
    pub valid_ratio: f64,

    /// Shuffle seed for a reproducible split.
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

#[derive(Parser)]
pub struct BuildArgs {
    /// Folder with the category CSVs, demographics.csv and labels.csv.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory (default: <INPUT_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Width of the time bucket that forms one record.
    #[arg(long = "granularity", value_enum, default_value = "second")]
    pub granularity: GranularityArg,

    /// Drop samples with more records than this.
    #[arg(long = "max-records", default_value_t = DEFAULT_MAX_RECORDS)]
    pub max_records: usize,

    #[command(flatten)]
    pub ingest: IngestArgs,

    #[command(flatten)]
    pub ratios: RatioArgs,

    /// Only write shard_input; skip the train / valid / test split.
    #[arg(long = "no-split")]
    pub no_split: bool,
}

#[derive(Parser)]
pub struct MergeArgs {
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// JSON-lines output file.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,

    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Parser)]
pub struct SplitArgs {
    #[arg(value_name = "SHARD_FILE")]
    pub shard_file: PathBuf,

    /// Output directory (default: the shard file's directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub ratios: RatioArgs,
}

#[derive(Parser)]
pub struct StatsArgs {
    #[arg(value_name = "SHARD_FILE")]
    pub shard_file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Second,
    Minute,
    Hour,
    Day,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Second => Granularity::Second,
            GranularityArg::Minute => Granularity::Minute,
            GranularityArg::Hour => Granularity::Hour,
            GranularityArg::Day => Granularity::Day,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
