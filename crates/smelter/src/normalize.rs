//! Field normalization: derived filter columns over preserved originals.
//!
//! The product rule for messy exports is that nothing the user saw is
//! ever rewritten. Normalization therefore only appends: each fuzzy or
//! percentage column gains one numeric `<name>_filter` sibling holding
//! the machine-usable value, and the original text stays byte-for-byte.
//! Filter values use a range's lower bound, a deliberate product policy
//! carried over from the dashboards these files come from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{ColumnRole, FieldConfig};
use crate::numeric::{parse_fuzzy, parse_percentage};
use crate::segment::TableSegment;

/// Suffix appended to derived numeric columns.
pub const FILTER_SUFFIX: &str = "_filter";

/// A derived numeric column alongside the preserved originals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedColumn {
    /// Deduplicated output name, e.g. `近30天销量_filter`.
    pub name: String,
    /// Name of the original column this was derived from.
    pub source_column: String,
    /// One value per row; None where the cell held no usable number.
    pub values: Vec<Option<f64>>,
}

/// A normalized table: originals untouched, derived columns appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedTable {
    /// Table name carried over from segmentation.
    pub name: String,
    /// Original column names, order preserved.
    pub column_names: Vec<String>,
    /// Original cell values, byte-for-byte.
    pub rows: Vec<Vec<String>>,
    /// Derived filter columns, in original column order.
    pub derived: Vec<DerivedColumn>,
    /// Configured required canonical fields not reachable from any
    /// original column. Recoverable; strict callers may promote it.
    pub missing_required: Vec<String>,
}

impl CleanedTable {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of original columns.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Output column names: originals first, then derived columns when
    /// `include_filters` is set.
    pub fn output_columns(&self, include_filters: bool) -> Vec<String> {
        let mut names = self.column_names.clone();
        if include_filters {
            names.extend(self.derived.iter().map(|d| d.name.clone()));
        }
        names
    }
}

/// Applies column roles from a [`FieldConfig`] to table segments.
pub struct FieldNormalizer {
    config: FieldConfig,
}

impl FieldNormalizer {
    /// Create a normalizer with the default Chanmama configuration.
    pub fn new() -> Self {
        Self::with_config(FieldConfig::default())
    }

    /// Create a normalizer with a custom configuration.
    pub fn with_config(config: FieldConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Normalize one segment into a [`CleanedTable`].
    pub fn normalize(&self, segment: &TableSegment) -> CleanedTable {
        let mut used: HashSet<String> = segment.column_names.iter().cloned().collect();
        let mut derived = Vec::new();

        for (j, column) in segment.column_names.iter().enumerate() {
            let values = match self.config.role_of(column) {
                ColumnRole::FuzzyRange => segment
                    .rows
                    .iter()
                    .map(|row| parse_fuzzy(cell(row, j)).min())
                    .collect(),
                ColumnRole::Percentage => segment
                    .rows
                    .iter()
                    .map(|row| parse_percentage(cell(row, j)))
                    .collect(),
                ColumnRole::Plain | ColumnRole::Identifier => continue,
            };
            let name = derived_name(column, &mut used);
            derived.push(DerivedColumn {
                name,
                source_column: column.clone(),
                values,
            });
        }

        let missing_required = self.missing_required(&segment.column_names);
        if !missing_required.is_empty() {
            tracing::warn!(
                "table '{}' is missing required fields: {}",
                segment.name,
                missing_required.join(", ")
            );
        }
        tracing::debug!(
            "normalized table '{}': {} rows, {} derived columns",
            segment.name,
            segment.rows.len(),
            derived.len()
        );

        CleanedTable {
            name: segment.name.clone(),
            column_names: segment.column_names.clone(),
            rows: segment.rows.clone(),
            derived,
            missing_required,
        }
    }

    /// Required canonical fields not reachable from the given columns.
    fn missing_required(&self, columns: &[String]) -> Vec<String> {
        let reachable: HashSet<String> = columns
            .iter()
            .filter_map(|c| self.config.canonical_of(c))
            .map(|c| c.trim().to_lowercase())
            .collect();
        self.config
            .required_fields
            .iter()
            .filter(|r| !reachable.contains(&r.trim().to_lowercase()))
            .cloned()
            .collect()
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Build `{column}_filter`, deduplicating against every name already in
/// use with the `{name}_{n}` scheme.
fn derived_name(column: &str, used: &mut HashSet<String>) -> String {
    let base = format!("{}{}", column, FILTER_SUFFIX);
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
    name
}
