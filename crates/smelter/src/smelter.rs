//! Main Smelter struct and public API.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::error::{Result, SmelterError};
use crate::input::{DocumentLoader, LoaderConfig, Sheet, SourceMetadata};
use crate::normalize::{CleanedTable, FieldNormalizer};
use crate::quality::{QualityReport, QualityReporter};
use crate::segment::{HeaderRules, TableSegmenter};

/// Table names preferred as the primary export, in priority order.
const PRIMARY_EXACT: &[&str] = &["抖音销量榜", "SKU商品库", "直播销量榜", "商品卡销量榜"];

/// Name fragments accepted when no exact primary name matches.
const PRIMARY_PARTIAL: &[&str] = &["销量", "商品", "榜", "库"];

/// Configuration for the full extraction pipeline.
#[derive(Debug, Clone)]
pub struct SmelterConfig {
    /// Document loading configuration.
    pub loader: LoaderConfig,
    /// Header recognition thresholds.
    pub rules: HeaderRules,
    /// Field mapping, roles and declared types.
    pub fields: FieldConfig,
}

impl Default for SmelterConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            rules: HeaderRules::default(),
            fields: FieldConfig::default(),
        }
    }
}

/// One extracted table with its quality report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTable {
    /// The normalized table.
    pub table: CleanedTable,
    /// Per-column quality measures.
    pub report: QualityReport,
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// Every table extracted, across all sheets.
    pub tables: Vec<ProcessedTable>,
    /// True when any sheet fell back to whole-sheet segmentation.
    pub degraded: bool,
}

impl ProcessOutcome {
    /// The table a caller most likely wants when exporting just one.
    ///
    /// Exact well-known names win, then names containing a ranking or
    /// catalog fragment, then the first table with data. Empty tables
    /// never qualify.
    pub fn primary_table(&self) -> Option<&ProcessedTable> {
        let non_empty = |t: &&ProcessedTable| t.table.row_count() > 0;

        for name in PRIMARY_EXACT {
            if let Some(found) = self
                .tables
                .iter()
                .filter(non_empty)
                .find(|t| t.table.name == *name)
            {
                return Some(found);
            }
        }
        self.tables
            .iter()
            .filter(non_empty)
            .find(|t| PRIMARY_PARTIAL.iter().any(|f| t.table.name.contains(f)))
            .or_else(|| self.tables.iter().find(non_empty))
    }
}

/// The extraction and normalization engine.
///
/// Runs the full pipeline: load → segment → normalize → report.
pub struct Smelter {
    config: SmelterConfig,
    loader: DocumentLoader,
    segmenter: TableSegmenter,
    normalizer: FieldNormalizer,
    reporter: QualityReporter,
}

impl Smelter {
    /// Create a new Smelter with default configuration.
    pub fn new() -> Self {
        Self::with_config(SmelterConfig::default())
    }

    /// Create a Smelter with custom configuration.
    pub fn with_config(config: SmelterConfig) -> Self {
        let loader = DocumentLoader::with_config(config.loader.clone());
        let segmenter = TableSegmenter::with_rules(config.rules.clone());
        let normalizer = FieldNormalizer::with_config(config.fields.clone());
        let reporter = QualityReporter::with_config(config.fields.clone());

        Self {
            config,
            loader,
            segmenter,
            normalizer,
            reporter,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SmelterConfig {
        &self.config
    }

    /// Process a document from disk.
    pub fn process_path(&self, path: impl AsRef<Path>) -> Result<ProcessOutcome> {
        let path = path.as_ref();
        let (sheets, source) = self.loader.load(path)?;
        self.process_sheets(sheets, source)
    }

    /// Process an in-memory document, typically an upload.
    pub fn process_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ProcessOutcome> {
        let (sheets, source) = self.loader.load_bytes(bytes, file_name)?;
        self.process_sheets(sheets, source)
    }

    fn process_sheets(
        &self,
        sheets: Vec<Sheet>,
        source: SourceMetadata,
    ) -> Result<ProcessOutcome> {
        tracing::info!(
            "processing {} ({} sheets, {} rows)",
            source.file,
            source.sheet_count,
            source.row_count
        );

        let mut tables = Vec::new();
        let mut degraded = false;
        for sheet in &sheets {
            let segmentation = self.segmenter.segment(sheet);
            degraded |= segmentation.degraded;
            for segment in &segmentation.segments {
                let cleaned = self.normalizer.normalize(segment);
                let report = self.reporter.report(&cleaned);
                tables.push(ProcessedTable {
                    table: cleaned,
                    report,
                });
            }
        }

        if tables.is_empty() {
            return Err(SmelterError::EmptyDocument(
                source.path.display().to_string(),
            ));
        }

        tracing::info!(
            "extracted {} tables from {}{}",
            tables.len(),
            source.file,
            if degraded { " (degraded)" } else { "" }
        );
        Ok(ProcessOutcome {
            source,
            tables,
            degraded,
        })
    }
}

impl Default for Smelter {
    fn default() -> Self {
        Self::new()
    }
}
