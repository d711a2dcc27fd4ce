use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::error::{IngestError, Result};

/// One data row with the line it was read from.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: u64,
    pub cells: Vec<String>,
}

impl CsvRow {
    /// Cell at `idx`, empty when the row is short.
    pub fn get(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
            path: self.path.clone(),
        })
    }

    pub fn invalid_value(
        &self,
        row: &CsvRow,
        field: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> IngestError {
        IngestError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            path: self.path.clone(),
            line: row.line,
            reason: reason.into(),
        }
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a CSV file whose first non-blank row is the header.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let csv_error = |source| IngestError::CsvParse {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let cells: Vec<String> = record.iter().map(normalize_cell).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        if headers.is_none() {
            headers = Some(record.iter().map(normalize_header).collect());
            continue;
        }
        let line = record.position().map(csv::Position::line).unwrap_or_default();
        rows.push(CsvRow { line, cells });
    }
    let headers = headers.ok_or_else(|| IngestError::EmptyCsv {
        path: path.to_path_buf(),
    })?;
    Ok(CsvTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_collapse_whitespace_and_bom() {
        assert_eq!(normalize_header("\u{feff} Patient   Id "), "Patient Id");
        assert_eq!(normalize_cell("  E11 "), "E11");
    }
}
