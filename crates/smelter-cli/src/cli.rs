//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Smelter: table extraction and cleaning for messy spreadsheet exports
#[derive(Parser)]
#[command(name = "smelter")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the tables found in an export file without cleaning it
    Info {
        /// File to inspect (CSV, TSV, or Excel)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract, normalize, and export the tables in one file
    Clean {
        /// File to clean (CSV, TSV, or Excel)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (default: <input>_cleaned.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Overwrite the output file if it already exists
        #[arg(long)]
        force: bool,

        /// Skip the per-column quality report
        #[arg(long)]
        no_quality_report: bool,

        /// Keep the derived numeric filter columns in the output
        #[arg(long)]
        include_filters: bool,

        /// Fail when required fields are missing from the table
        #[arg(long)]
        strict: bool,

        /// Field configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Export every extracted table instead of just the primary one
        #[arg(long)]
        all_tables: bool,
    },

    /// Clean every matching file in a directory
    Batch {
        /// Directory containing export files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Number of worker threads (1-8)
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Glob pattern for files to clean
        #[arg(short, long, default_value = "*.csv")]
        pattern: String,

        /// Output directory (default: <dir>/cleaned)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Field configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Output format for cleaned tables
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            #[cfg(feature = "parquet")]
            "parquet" => Ok(OutputFormat::Parquet),
            #[cfg(not(feature = "parquet"))]
            "parquet" => Err("Parquet support not enabled. Rebuild with --features parquet".to_string()),
            _ => Err(format!("Unknown format: {}. Use csv, json, or parquet.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => write!(f, "parquet"),
        }
    }
}

impl OutputFormat {
    /// File extension for output files in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => "parquet",
        }
    }
}
