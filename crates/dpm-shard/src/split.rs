//! Shuffled train / validation / test split of shard lines.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ShardError};

pub const TRAIN_FILE: &str = "train.shard";
pub const VALID_FILE: &str = "valid.shard";
pub const TEST_FILE: &str = "test.shard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Share of samples that go to training.
    pub train_ratio: f64,
    /// Share of samples that go to validation, taken after training.
    pub valid_ratio: f64,
    /// Fixed shuffle seed; `None` shuffles from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            train_ratio: 0.9,
            valid_ratio: 0.0,
            seed: None,
        }
    }
}

impl SplitOptions {
    #[must_use]
    pub fn with_train_ratio(mut self, ratio: f64) -> Self {
        self.train_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_valid_ratio(mut self, ratio: f64) -> Self {
        self.valid_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |ratio: f64| (0.0..=1.0).contains(&ratio);
        if !in_range(self.train_ratio)
            || !in_range(self.valid_ratio)
            || self.train_ratio + self.valid_ratio > 1.0 + f64::EPSILON
        {
            return Err(ShardError::InvalidRatio {
                train: self.train_ratio,
                valid: self.valid_ratio,
            });
        }
        Ok(())
    }
}

/// Lines assigned to each part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSamples {
    pub train: Vec<String>,
    pub valid: Vec<String>,
    pub test: Vec<String>,
}

impl SplitSamples {
    pub fn total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }
}

fn share(total: usize, ratio: f64) -> usize {
    ((total as f64 * ratio).floor() as usize).min(total)
}

/// Shuffle `lines` and cut them into train, validation and test parts.
pub fn split_samples(mut lines: Vec<String>, options: &SplitOptions) -> Result<SplitSamples> {
    options.validate()?;
    match options.seed {
        Some(seed) => lines.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => lines.shuffle(&mut rand::rng()),
    }

    let total = lines.len();
    let train_end = share(total, options.train_ratio);
    let valid_end = (train_end + share(total, options.valid_ratio)).min(total);
    let test = lines.split_off(valid_end);
    let valid = lines.split_off(train_end);
    Ok(SplitSamples {
        train: lines,
        valid,
        test,
    })
}

/// Non-blank lines of a shard file, without line terminators.
pub fn read_shard_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|source| ShardError::Io {
        operation: "open",
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| ShardError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let io_error = |operation: &'static str| {
        move |source| ShardError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    };
    let file = File::create(path).map_err(io_error("create"))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}").map_err(io_error("write"))?;
    }
    out.flush().map_err(io_error("write"))?;
    Ok(())
}

/// Write `train.shard`, `valid.shard` and `test.shard` into `dir`.
///
/// All three files are written even when a part is empty.
pub fn write_split(dir: &Path, split: &SplitSamples) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(3);
    for (name, lines) in [
        (TRAIN_FILE, &split.train),
        (VALID_FILE, &split.valid),
        (TEST_FILE, &split.test),
    ] {
        let path = dir.join(name);
        write_lines(&path, lines)?;
        written.push(path);
    }
    info!(
        train = split.train.len(),
        valid = split.valid.len(),
        test = split.test.len(),
        "split written"
    );
    Ok(written)
}
