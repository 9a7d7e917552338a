//! Document loading for delimited text and workbook formats.
//!
//! Produces format-agnostic [`Sheet`] matrices: a delimited text file
//! becomes one sheet, a workbook one sheet per non-blank worksheet.
//! Cell values are rendered to trimmed strings here so every later
//! stage works on the same representation regardless of source format.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use sha2::{Digest, Sha256};

use crate::error::{Result, SmelterError};
use crate::input::encoding::EncodingResolver;
use crate::input::sheet::{Sheet, SourceMetadata};

/// File extensions parsed as delimited text.
const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// File extensions parsed with the workbook reader.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Delimiters considered during detection, in priority order.
const DELIMITER_CANDIDATES: &[u8] = &[b'\t', b',', b';', b'|'];

/// Lines sampled from the head of a text document for delimiter scoring.
const DELIMITER_SAMPLE_LINES: usize = 10;

/// Configuration for [`DocumentLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Force a delimiter for text input instead of detecting one.
    pub delimiter: Option<u8>,
    /// Quote character for text input.
    pub quote: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
        }
    }
}

/// Loads a source document into raw sheets plus provenance metadata.
pub struct DocumentLoader {
    config: LoaderConfig,
    resolver: EncodingResolver,
}

impl DocumentLoader {
    /// Create a loader with default configuration.
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            resolver: EncodingResolver::new(),
        }
    }

    /// Load a file from disk, dispatching on its extension.
    ///
    /// Returns the non-blank sheets and the source metadata. Fails with
    /// [`SmelterError::UnsupportedFormat`] for unrecognized extensions
    /// and [`SmelterError::EmptyDocument`] when no usable rows survive.
    pub fn load(&self, path: &Path) -> Result<(Vec<Sheet>, SourceMetadata)> {
        let bytes = fs::read(path).map_err(|source| SmelterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from(&bytes, path)
    }

    /// Load an in-memory document, using `file_name` for extension
    /// dispatch and metadata. The upload path of callers that never
    /// touch the filesystem.
    pub fn load_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<(Vec<Sheet>, SourceMetadata)> {
        self.load_from(bytes, Path::new(file_name))
    }

    fn load_from(&self, bytes: &[u8], path: &Path) -> Result<(Vec<Sheet>, SourceMetadata)> {
        let hash = content_hash(bytes);
        let size_bytes = bytes.len() as u64;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let (sheets, format, encoding) = if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            self.load_text(path, bytes)?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            self.load_workbook(path, bytes, &extension)?
        } else {
            return Err(SmelterError::UnsupportedFormat(format!(
                "'{}' (expected one of: csv, tsv, txt, xlsx, xls, xlsm, xlsb, ods)",
                path.display()
            )));
        };

        let row_count = sheets.iter().map(Sheet::row_count).sum();
        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            encoding,
            sheets.len(),
            row_count,
        );
        tracing::debug!(
            "loaded {} ({}, {}): {} sheets, {} rows",
            metadata.file,
            metadata.format,
            metadata.encoding,
            metadata.sheet_count,
            metadata.row_count
        );
        Ok((sheets, metadata))
    }

    /// Parse a delimited text document into a single sheet.
    fn load_text(&self, path: &Path, bytes: &[u8]) -> Result<(Vec<Sheet>, String, String)> {
        let resolved = self.resolver.resolve(bytes)?;
        let text = resolved.decode(bytes);

        let delimiter = self
            .config
            .delimiter
            .unwrap_or_else(|| detect_delimiter(&text));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SmelterError::EmptyDocument(path.display().to_string()));
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet1");
        let sheet = Sheet::new(name, rows);
        Ok((vec![sheet], format_name(delimiter), resolved.name))
    }

    /// Read every non-blank worksheet from a workbook.
    fn load_workbook(
        &self,
        path: &Path,
        bytes: &[u8],
        extension: &str,
    ) -> Result<(Vec<Sheet>, String, String)> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(render_cell).collect::<Vec<String>>())
                .filter(|row| row.iter().any(|cell| !cell.is_empty()))
                .collect();
            if rows.is_empty() {
                continue;
            }
            sheets.push(Sheet::new(name, rows));
        }

        if sheets.is_empty() {
            return Err(SmelterError::EmptyDocument(path.display().to_string()));
        }
        Ok((sheets, extension.to_string(), "binary".to_string()))
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of the raw file content, prefixed with the algorithm name.
fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Pick the most plausible delimiter from the head of a text document.
///
/// Each candidate is scored per sampled line as column count weighted by
/// the fraction of non-empty columns, then averaged over the lines that
/// contained it at all. Ties keep the earlier candidate, so tab wins
/// over comma for tab-separated files with commas inside titles.
fn detect_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(DELIMITER_SAMPLE_LINES)
        .collect();

    let mut best = b'\t';
    let mut best_score = 0.0_f64;
    for &candidate in DELIMITER_CANDIDATES {
        let sep = candidate as char;
        let mut scores = Vec::new();
        for line in &lines {
            if !line.contains(sep) {
                continue;
            }
            let parts: Vec<&str> = line.split(sep).collect();
            if parts.len() < 2 {
                continue;
            }
            let non_empty = parts.iter().filter(|p| !p.trim().is_empty()).count();
            scores.push(parts.len() as f64 * (non_empty as f64 / parts.len() as f64));
        }
        if scores.is_empty() {
            continue;
        }
        let score = scores.iter().sum::<f64>() / scores.len() as f64;
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

/// Human-readable format label for a detected delimiter.
fn format_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
    .to_string()
}

/// Render a workbook cell to the string form the rest of the pipeline
/// expects. Integral floats drop their fractional part so a rank column
/// stored as 1.0 reads back as "1".
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str, extension: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_comma_csv() {
        let file = create_test_file("排名,商品,销量\n1,面膜,5w\n2,口红,3000\n", "csv");
        let loader = DocumentLoader::new();
        let (sheets, metadata) = loader.load(file.path()).unwrap();

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].row_count(), 3);
        assert_eq!(sheets[0].get(0, 1), Some("商品"));
        assert_eq!(metadata.format, "csv");
        assert_eq!(metadata.encoding, "utf-8");
        assert_eq!(metadata.sheet_count, 1);
        assert_eq!(metadata.row_count, 3);
        assert!(metadata.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_load_tab_separated_txt() {
        let file = create_test_file("商品\t销量\t销售额\nA\t100\t2000\n", "txt");
        let loader = DocumentLoader::new();
        let (sheets, metadata) = loader.load(file.path()).unwrap();

        assert_eq!(metadata.format, "tsv");
        assert_eq!(sheets[0].width(), 3);
        assert_eq!(sheets[0].get(1, 2), Some("2000"));
    }

    #[test]
    fn test_load_gbk_csv() {
        // "商品,销量\n面膜,100\n" encoded as GBK
        let bytes: &[u8] = &[
            0xC9, 0xCC, 0xC6, 0xB7, b',', 0xCF, 0xFA, 0xC1, 0xBF, b'\n', 0xC3, 0xE6, 0xC4, 0xA4,
            b',', b'1', b'0', b'0', b'\n',
        ];
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();

        let loader = DocumentLoader::new();
        let (sheets, metadata) = loader.load(file.path()).unwrap();
        assert_eq!(metadata.encoding, "gbk");
        assert_eq!(sheets[0].get(0, 0), Some("商品"));
        assert_eq!(sheets[0].get(1, 0), Some("面膜"));
    }

    #[test]
    fn test_load_bytes_with_name_hint() {
        let loader = DocumentLoader::new();
        let (sheets, metadata) = loader
            .load_bytes("商品,销量\nA,5w\n".as_bytes(), "upload.csv")
            .unwrap();
        assert_eq!(metadata.file, "upload.csv");
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "upload");
        assert_eq!(sheets[0].get(1, 1), Some("5w"));
    }

    #[test]
    fn test_blank_lines_dropped() {
        let file = create_test_file("a,b\n\n,,\n1,2\n", "csv");
        let loader = DocumentLoader::new();
        let (sheets, _) = loader.load(file.path()).unwrap();
        assert_eq!(sheets[0].row_count(), 2);
    }

    #[test]
    fn test_ragged_rows_padded() {
        let file = create_test_file("抖音销量榜\na,b,c\n1,2,3\n", "csv");
        let loader = DocumentLoader::new();
        let (sheets, _) = loader.load(file.path()).unwrap();
        assert_eq!(sheets[0].width(), 3);
        assert_eq!(sheets[0].get(0, 0), Some("抖音销量榜"));
        assert_eq!(sheets[0].get(0, 2), Some(""));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = create_test_file("a,b\n1,2\n", "pdf");
        let loader = DocumentLoader::new();
        let result = loader.load(file.path());
        assert!(matches!(result, Err(SmelterError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_document() {
        let file = create_test_file("", "csv");
        let loader = DocumentLoader::new();
        let result = loader.load(file.path());
        assert!(matches!(result, Err(SmelterError::EmptyDocument(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = DocumentLoader::new();
        let result = loader.load(Path::new("/nonexistent/data.csv"));
        assert!(matches!(result, Err(SmelterError::Io { .. })));
    }

    #[test]
    fn test_forced_delimiter_overrides_detection() {
        let file = create_test_file("a;b;c\n1;2;3\n", "csv");
        let loader = DocumentLoader::with_config(LoaderConfig {
            delimiter: Some(b';'),
            quote: b'"',
        });
        let (sheets, metadata) = loader.load(file.path()).unwrap();
        assert_eq!(metadata.format, "csv-semicolon");
        assert_eq!(sheets[0].width(), 3);
    }

    #[test]
    fn test_detect_delimiter_prefers_denser_split() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3\n"), b'|');
    }

    #[test]
    fn test_detect_delimiter_tab_wins_over_stray_commas() {
        // Commas only inside one title cell, tabs on every line.
        let text = "榜单,导出\tA\tB\tC\n1\t2\t3\t4\n5\t6\t7\t8\n";
        assert_eq!(detect_delimiter(text), b'\t');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_tab() {
        assert_eq!(detect_delimiter("single column\nno separators\n"), b'\t');
    }

    #[test]
    fn test_quoted_fields_keep_embedded_delimiter() {
        let file = create_test_file("商品,价格\n\"面膜, 三件装\",59\n", "csv");
        let loader = DocumentLoader::new();
        let (sheets, _) = loader.load(file.path()).unwrap();
        assert_eq!(sheets[0].get(1, 0), Some("面膜, 三件装"));
    }

    #[test]
    fn test_render_cell_numeric_forms() {
        assert_eq!(render_cell(&Data::Float(1.0)), "1");
        assert_eq!(render_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(render_cell(&Data::Int(42)), "42");
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::String("  x  ".to_string())), "x");
    }
}
