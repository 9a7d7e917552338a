//! Per-column quality reporting for cleaned tables.
//!
//! Reports are descriptive, not gatekeeping: they count nulls, infer a
//! coarse value type from a sample, and check declared-type conformance
//! where the configuration maps a column to a typed canonical field.
//! Nothing here rejects data.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{FieldConfig, FieldType};
use crate::input::Sheet;
use crate::normalize::CleanedTable;

/// Cap on values sampled per column for type inference.
const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Date layouts accepted for `Date` conformance.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

/// Datetime layouts accepted for `Datetime` conformance (and for `Date`
/// columns that an exporter rendered with a time component).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Coarse value type inferred from sampled cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    /// Every sampled value parses as a number.
    Numeric,
    /// No sampled value parses as a number, or every value was null.
    Text,
    /// Some sampled values parse, some do not.
    Mixed,
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferredType::Numeric => write!(f, "numeric"),
            InferredType::Text => write!(f, "text"),
            InferredType::Mixed => write!(f, "mixed"),
        }
    }
}

/// Quality measures for one output column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnQuality {
    /// Cells holding a null token (or absent derived values).
    pub null_count: usize,
    /// `null_count / row_count`; 0.0 for empty tables.
    pub null_rate: f64,
    /// Coarse type inferred from a sample of non-null values.
    pub inferred_type: InferredType,
    /// Declared type from the configuration, when mapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<FieldType>,
    /// Fraction of sampled non-null values conforming to the declared
    /// type. Only present alongside `expected_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conformance: Option<f64>,
}

/// Quality summary for one cleaned table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub table_name: String,
    pub row_count: usize,
    /// Output columns: originals plus derived.
    pub column_count: usize,
    pub per_column: IndexMap<String, ColumnQuality>,
}

/// Produces [`QualityReport`]s from cleaned tables.
pub struct QualityReporter {
    sample_size: usize,
    config: FieldConfig,
}

impl QualityReporter {
    /// Create a reporter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(FieldConfig::default())
    }

    /// Create a reporter with a custom configuration.
    pub fn with_config(config: FieldConfig) -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            config,
        }
    }

    /// Override the per-column sample cap.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Build the quality report for a cleaned table.
    pub fn report(&self, table: &CleanedTable) -> QualityReport {
        let row_count = table.row_count();
        let mut per_column = IndexMap::new();

        for (j, column) in table.column_names.iter().enumerate() {
            let values: Vec<&str> = table
                .rows
                .iter()
                .map(|row| row.get(j).map(String::as_str).unwrap_or(""))
                .collect();
            per_column.insert(column.clone(), self.column_quality(column, &values));
        }

        for derived in &table.derived {
            per_column.insert(derived.name.clone(), derived_quality(&derived.values));
        }

        QualityReport {
            table_name: table.name.clone(),
            row_count,
            column_count: table.column_count() + table.derived.len(),
            per_column,
        }
    }

    fn column_quality(&self, column: &str, values: &[&str]) -> ColumnQuality {
        let null_count = values.iter().filter(|v| Sheet::is_null_value(v)).count();
        let non_null: Vec<&str> = values
            .iter()
            .copied()
            .filter(|v| !Sheet::is_null_value(v))
            .collect();
        let sample = reservoir_sample(&non_null, self.sample_size);

        let expected_type = self.config.expected_type(column);
        let conformance = expected_type.map(|ty| {
            if sample.is_empty() {
                return 0.0;
            }
            let conforming = sample.iter().filter(|v| conforms(v, ty)).count();
            conforming as f64 / sample.len() as f64
        });

        ColumnQuality {
            null_count,
            null_rate: rate(null_count, values.len()),
            inferred_type: infer_type(&sample),
            expected_type,
            conformance,
        }
    }
}

impl Default for QualityReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Quality for a derived column; values are numeric by construction.
fn derived_quality(values: &[Option<f64>]) -> ColumnQuality {
    let null_count = values.iter().filter(|v| v.is_none()).count();
    let inferred_type = if null_count == values.len() {
        InferredType::Text
    } else {
        InferredType::Numeric
    };
    ColumnQuality {
        null_count,
        null_rate: rate(null_count, values.len()),
        inferred_type,
        expected_type: None,
        conformance: None,
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Uniform sample of up to `cap` values.
fn reservoir_sample<'a>(values: &[&'a str], cap: usize) -> Vec<&'a str> {
    let mut sample: Vec<&str> = Vec::with_capacity(cap.min(values.len()));
    for (seen, value) in values.iter().copied().enumerate() {
        if sample.len() < cap {
            sample.push(value);
        } else {
            let idx = fastrand::usize(0..seen + 1);
            if idx < cap {
                sample[idx] = value;
            }
        }
    }
    sample
}

/// Classify a sample: numeric only when every value parses.
fn infer_type(sample: &[&str]) -> InferredType {
    if sample.is_empty() {
        return InferredType::Text;
    }
    let numeric = sample
        .iter()
        .filter(|v| v.trim().parse::<f64>().is_ok())
        .count();
    if numeric == sample.len() {
        InferredType::Numeric
    } else if numeric == 0 {
        InferredType::Text
    } else {
        InferredType::Mixed
    }
}

/// Does a raw cell conform to a declared type?
fn conforms(value: &str, ty: FieldType) -> bool {
    let value = value.trim();
    match ty {
        FieldType::Utf8 => true,
        FieldType::Float64 => value.parse::<f64>().is_ok(),
        FieldType::Int64 => value.parse::<i64>().is_ok(),
        FieldType::Date => {
            DATE_FORMATS
                .iter()
                .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
                || DATETIME_FORMATS
                    .iter()
                    .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
        }
        FieldType::Datetime => DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok()),
    }
}
