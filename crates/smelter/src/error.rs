//! Error types for the Smelter library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Smelter operations.
#[derive(Debug, Error)]
pub enum SmelterError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No candidate encoding could decode the document.
    #[error("Encoding resolution failed: {0}")]
    EncodingResolution(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no usable rows.
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    /// A configured required field was absent after normalization.
    /// Only raised in strict mode; otherwise recorded on the cleaned table.
    #[error("Table '{table}' is missing required fields: {}", .fields.join(", "))]
    MissingRequiredFields { table: String, fields: Vec<String> },

    /// Error assembling an export payload.
    #[error("Export error: {0}")]
    Export(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the spreadsheet reader.
    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error parsing a TOML configuration file.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Error writing Parquet output.
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Error building Arrow arrays for Parquet output.
    #[cfg(feature = "parquet")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Result type alias for Smelter operations.
pub type Result<T> = std::result::Result<T, SmelterError>;
