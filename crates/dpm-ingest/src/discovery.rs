//! Input file discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dpm_model::EventCategory;

use crate::error::{IngestError, Result};

pub const DEMOGRAPHICS_STEM: &str = "demographics";
pub const LABELS_STEM: &str = "labels";

/// Files found in an input directory.
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    pub events: BTreeMap<EventCategory, PathBuf>,
    pub demographics: Option<PathBuf>,
    pub labels: Option<PathBuf>,
}

impl InputFiles {
    /// Categories with no event file.
    pub fn missing_categories(&self) -> Vec<EventCategory> {
        EventCategory::ALL
            .into_iter()
            .filter(|category| !self.events.contains_key(category))
            .collect()
    }
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Match CSV files to event categories and side tables by file stem.
///
/// Stems compare case-insensitively; files that match nothing are ignored.
/// When two files share a stem (`Diagnosis.csv`, `diagnosis.csv`) the first
/// in filename order wins.
pub fn discover_input_files(dir: &Path) -> Result<InputFiles> {
    let mut found = InputFiles::default();
    for path in list_csv_files(dir)? {
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if stem == DEMOGRAPHICS_STEM {
            found.demographics.get_or_insert(path);
            continue;
        }
        if stem == LABELS_STEM {
            found.labels.get_or_insert(path);
            continue;
        }
        if let Some(category) = EventCategory::ALL
            .into_iter()
            .find(|category| category.file_stem() == stem)
        {
            found.events.entry(category).or_insert(path);
        }
    }
    Ok(found)
}
