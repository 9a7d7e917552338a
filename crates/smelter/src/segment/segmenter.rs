//! Header recognition and multi-table sheet partitioning.
//!
//! Chanmama exports routinely stack several tables in one sheet, each
//! preceded by a title row and a header row. The segmenter scores every
//! row against a keyword vocabulary, treats qualifying rows as headers,
//! and partitions the sheet at those rows. When nothing qualifies it
//! falls back to a single whole-sheet table and flags the result as
//! degraded rather than failing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::input::Sheet;
use crate::segment::keywords::{
    CORE_COMBO, GENERIC_NAME_MARKERS, HEADER_KEYWORDS, TABLE_NAME_KEYWORDS,
};

/// Thresholds governing header recognition.
///
/// A row is a header candidate when any of three keyword gates passes
/// and its non-blank density clears `min_density`. The defaults encode
/// the layouts observed across Chanmama ranking and SKU exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderRules {
    /// Keyword matches required by the strong gate.
    pub min_keyword_strong: usize,
    /// Distinct non-blank cells required by the strong gate.
    pub min_non_empty_strong: usize,
    /// Keyword matches required by the weak gate.
    pub min_keyword_weak: usize,
    /// Distinct non-blank cells required by the weak gate.
    pub min_non_empty_weak: usize,
    /// Core-combination matches required by the core gate.
    pub min_core_matches: usize,
    /// Distinct non-blank cells required by the core gate.
    pub min_non_empty_core: usize,
    /// Non-blank density a candidate must strictly exceed.
    pub min_density: f64,
    /// Distinct non-blank cells required of a fallback header row.
    pub min_non_empty_fallback: usize,
    /// How many rows above a header are scanned for a table title.
    pub title_scan_rows: usize,
}

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            min_keyword_strong: 2,
            min_non_empty_strong: 4,
            min_keyword_weak: 1,
            min_non_empty_weak: 5,
            min_core_matches: 2,
            min_non_empty_core: 3,
            min_density: 0.4,
            min_non_empty_fallback: 3,
            title_scan_rows: 3,
        }
    }
}

/// Per-row evidence used by header recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFeatures {
    /// Index of the row within its sheet.
    pub row_index: usize,
    /// Count of distinct non-blank trimmed values. Duplicates collapse,
    /// so a row of repeated filler scores low.
    pub non_empty: usize,
    /// Width of the (padded) row.
    pub total_columns: usize,
    /// Header keywords matched by exact equality.
    pub keyword_matches: usize,
    /// Core-combination terms matched by exact equality.
    pub core_matches: usize,
}

impl RowFeatures {
    /// Compute features for a single row.
    pub fn compute(row_index: usize, row: &[String]) -> Self {
        let distinct: HashSet<&str> = row
            .iter()
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .collect();
        let keyword_matches = HEADER_KEYWORDS
            .iter()
            .filter(|kw| distinct.contains(**kw))
            .count();
        let core_matches = CORE_COMBO
            .iter()
            .filter(|kw| distinct.contains(**kw))
            .count();
        Self {
            row_index,
            non_empty: distinct.len(),
            total_columns: row.len(),
            keyword_matches,
            core_matches,
        }
    }
}

/// One table cut out of a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSegment {
    /// Extracted or synthesized table name.
    pub name: String,
    /// Index of the header row within the source sheet.
    pub header_row_index: usize,
    /// Deduplicated column names.
    pub column_names: Vec<String>,
    /// Body rows, one cell per column.
    pub rows: Vec<Vec<String>>,
}

impl TableSegment {
    /// Number of body rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }
}

/// Result of partitioning one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    /// Recognized tables, ordered by header row index.
    pub segments: Vec<TableSegment>,
    /// True when no header row was recognized and the whole sheet was
    /// kept as a single table.
    pub degraded: bool,
}

/// Partitions sheets into table segments.
pub struct TableSegmenter {
    rules: HeaderRules,
}

impl TableSegmenter {
    /// Create a segmenter with default rules.
    pub fn new() -> Self {
        Self::with_rules(HeaderRules::default())
    }

    /// Create a segmenter with custom rules.
    pub fn with_rules(rules: HeaderRules) -> Self {
        Self { rules }
    }

    /// Whether a row qualifies as a header under the configured rules.
    pub fn is_header_candidate(&self, features: &RowFeatures) -> bool {
        if features.total_columns == 0 {
            return false;
        }
        let density = features.non_empty as f64 / features.total_columns as f64;
        if density <= self.rules.min_density {
            return false;
        }
        (features.keyword_matches >= self.rules.min_keyword_strong
            && features.non_empty >= self.rules.min_non_empty_strong)
            || (features.keyword_matches >= self.rules.min_keyword_weak
                && features.non_empty >= self.rules.min_non_empty_weak)
            || (features.core_matches >= self.rules.min_core_matches
                && features.non_empty >= self.rules.min_non_empty_core)
    }

    /// Partition a sheet into table segments.
    ///
    /// Never fails: a sheet where no header is recognized comes back as
    /// one whole-sheet segment with `degraded` set. Zero segments only
    /// happen for a sheet with no non-blank cell at all.
    pub fn segment(&self, sheet: &Sheet) -> Segmentation {
        let features: Vec<RowFeatures> = sheet
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| RowFeatures::compute(i, row))
            .collect();

        let header_indices: Vec<usize> = features
            .iter()
            .filter(|f| self.is_header_candidate(f))
            .map(|f| f.row_index)
            .collect();

        let mut segments = Vec::new();
        for (i, &header) in header_indices.iter().enumerate() {
            let end = header_indices
                .get(i + 1)
                .copied()
                .unwrap_or(sheet.rows.len());
            if let Some(segment) = self.build_segment(sheet, header, end) {
                segments.push(segment);
            }
        }

        if !segments.is_empty() {
            return Segmentation {
                segments,
                degraded: false,
            };
        }

        // Either nothing qualified or every candidate had an empty body.
        let fallback = features
            .iter()
            .find(|f| f.non_empty >= self.rules.min_non_empty_fallback)
            .or_else(|| features.iter().find(|f| f.non_empty > 0))
            .map(|f| f.row_index);

        let Some(header) = fallback else {
            tracing::warn!("sheet '{}' has no non-blank cells", sheet.name);
            return Segmentation {
                segments: Vec::new(),
                degraded: true,
            };
        };

        tracing::warn!(
            "no header row recognized in sheet '{}', keeping whole sheet as one table from row {}",
            sheet.name,
            header
        );
        let segment = self
            .build_segment(sheet, header, sheet.rows.len())
            .unwrap_or_else(|| TableSegment {
                name: self.table_name(sheet, header),
                header_row_index: header,
                column_names: dedup_columns(&sheet.rows[header]),
                rows: Vec::new(),
            });
        Segmentation {
            segments: vec![segment],
            degraded: true,
        }
    }

    /// Build the segment spanning `header + 1 .. end`, or None when the
    /// body has no non-blank rows.
    fn build_segment(&self, sheet: &Sheet, header: usize, end: usize) -> Option<TableSegment> {
        let rows: Vec<Vec<String>> = sheet.rows[header + 1..end]
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .cloned()
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(TableSegment {
            name: self.table_name(sheet, header),
            header_row_index: header,
            column_names: dedup_columns(&sheet.rows[header]),
            rows,
        })
    }

    /// Extract a table name from the title rows above a header.
    ///
    /// Scans upward-from-furthest within `title_scan_rows` rows: first
    /// pass takes a joined row containing a table-type keyword, second
    /// pass settles for a generic marker. Without either the name is
    /// synthesized from the header row index.
    fn table_name(&self, sheet: &Sheet, header: usize) -> String {
        let start = header.saturating_sub(self.rules.title_scan_rows);
        let joined: Vec<String> = (start..header)
            .map(|i| {
                sheet.rows[i]
                    .iter()
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect::<Vec<&str>>()
                    .join(" ")
            })
            .collect();

        for title in &joined {
            if !title.is_empty() && TABLE_NAME_KEYWORDS.iter().any(|kw| title.contains(kw)) {
                return title.clone();
            }
        }
        for title in &joined {
            if !title.is_empty() && GENERIC_NAME_MARKERS.iter().any(|kw| title.contains(kw)) {
                return title.clone();
            }
        }
        format!("table_{}", header)
    }
}

impl Default for TableSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Deduplicate header cells into unique column names.
///
/// Blank cells become `col_{j}` by position before deduplication; the
/// n-th repeat of a name becomes `{name}_{n}`, so the second occurrence
/// of 商品 is 商品_1.
pub fn dedup_columns(cells: &[String]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(cells.len());
    for (j, cell) in cells.iter().enumerate() {
        let trimmed = cell.trim();
        let base = if trimmed.is_empty() {
            format!("col_{}", j)
        } else {
            trimmed.to_string()
        };
        let name = if used.contains(&base) {
            let mut n = 1;
            loop {
                let candidate = format!("{}_{}", base, n);
                if !used.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            base
        };
        used.insert(name.clone());
        names.push(name);
    }
    names
}
