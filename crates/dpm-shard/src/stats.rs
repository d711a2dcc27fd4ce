//! Summary statistics over a shard file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardError};
use crate::sample::ShardSample;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardStats {
    pub samples: usize,
    /// Distinct patient indices.
    pub patients: usize,
    /// Mean of record deltas plus label delta, in seconds.
    pub average_time_span: f64,
    pub max_records: usize,
}

impl ShardStats {
    /// Fold parsed samples into statistics.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a ShardSample>) -> Self {
        let mut patients = HashSet::new();
        let mut count = 0usize;
        let mut total_span = 0i64;
        let mut max_records = 0usize;
        for sample in samples {
            count += 1;
            patients.insert(sample.patient);
            total_span += sample.time_span();
            max_records = max_records.max(sample.records.len());
        }
        Self {
            samples: count,
            patients: patients.len(),
            average_time_span: if count == 0 {
                0.0
            } else {
                total_span as f64 / count as f64
            },
            max_records,
        }
    }

    /// Read shard lines from `reader`; blank lines are ignored.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let samples = read_samples(reader)?;
        Ok(Self::from_samples(&samples))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ShardError::Io {
            operation: "open",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

/// Parse every non-blank line of a shard stream.
pub fn read_samples<R: BufRead>(reader: R) -> Result<Vec<ShardSample>> {
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(ShardSample::parse(&line, idx + 1)?);
    }
    Ok(samples)
}
