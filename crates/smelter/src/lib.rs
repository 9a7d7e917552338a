//! Smelter: extraction and normalization engine for messy spreadsheet exports.
//!
//! Smelter ingests CSV/Excel exports that pack several logically distinct
//! tables into one sheet, recognizes where each embedded table starts, and
//! turns ambiguous human-readable numeric fields ("7.5w~10w", "20.00%",
//! "100万") into machine-usable values.
//!
//! # Core Principles
//!
//! - **Preservation**: original cell text is never modified; derived
//!   numeric columns are appended alongside it
//! - **Degradation over failure**: a sheet with no recognizable header
//!   still comes back as one table, flagged as degraded
//! - **Unparsable is a value**: a cell that carries no number yields an
//!   absent derived value, never zero and never an error
//!
//! # Example
//!
//! ```no_run
//! use smelter::Smelter;
//!
//! let smelter = Smelter::new();
//! let outcome = smelter.process_path("抖音销量榜.csv").unwrap();
//!
//! for processed in &outcome.tables {
//!     println!("{}: {} rows", processed.table.name, processed.table.row_count());
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod input;
pub mod normalize;
pub mod numeric;
pub mod quality;
pub mod segment;

mod smelter;

pub use crate::smelter::{ProcessOutcome, ProcessedTable, Smelter, SmelterConfig};
pub use config::{ColumnRole, FieldConfig, FieldType};
pub use error::{Result, SmelterError};
pub use export::ExportOptions;
pub use input::{DocumentLoader, Sheet, SourceMetadata};
pub use normalize::{CleanedTable, DerivedColumn, FieldNormalizer};
pub use numeric::{parse_fuzzy, parse_percentage, FuzzyNumber};
pub use quality::{InferredType, QualityReport, QualityReporter};
pub use segment::{HeaderRules, Segmentation, TableSegment, TableSegmenter};
