//! Raw sheet matrix and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a loaded source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, etc.).
    pub format: String,
    /// Resolved text encoding ("utf-8" for workbook formats).
    pub encoding: String,
    /// Number of worksheets loaded.
    pub sheet_count: usize,
    /// Total raw rows across all sheets.
    pub row_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        encoding: String,
        sheet_count: usize,
        row_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            encoding,
            sheet_count,
            row_count,
            loaded_at: Utc::now(),
        }
    }
}

/// A rectangular matrix of raw cell values, one per worksheet or text file.
///
/// Rows are padded to a uniform width at load time. No header semantics
/// here; header recognition happens in the segmenter.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Sheet identifier (worksheet name or file stem).
    pub name: String,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create a new sheet, padding every row to the widest row's length.
    pub fn new(name: impl Into<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            while row.len() < width {
                row.push(String::new());
            }
        }
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Uniform row width.
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// True when no cell in the sheet holds non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }

    /// Check if a value represents a missing/null value.
    ///
    /// Covers the placeholder tokens seen in Chanmama/Douyin exports in
    /// addition to the usual NA spellings.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed == "-"
            || trimmed == "—"
            || trimmed == "–"
            || trimmed == "无"
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nan")
    }
}
