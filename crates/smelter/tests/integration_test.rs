//! End-to-end tests for the Smelter pipeline.

use std::io::Write;
use tempfile::NamedTempFile;

use smelter::{
    export, ColumnRole, ExportOptions, FieldConfig, Smelter, SmelterConfig, SmelterError,
};

/// Helper to create a temporary file with the given content and extension.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    create_test_file_bytes(content.as_bytes(), suffix)
}

/// Byte-level variant for non-UTF-8 content.
fn create_test_file_bytes(content: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content)
        .expect("Failed to write to temp file");
    file
}

// =============================================================================
// Basic Functionality Tests
// =============================================================================

#[test]
fn test_process_simple_csv() {
    let content = "排名,商品,佣金比例\n\
                   1,美白面膜,20%\n\
                   2,保湿口红,15%\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.source.format, "csv");
    assert_eq!(outcome.source.encoding, "utf-8");
    assert_eq!(outcome.source.row_count, 3);
    assert_eq!(outcome.tables.len(), 1);
    assert!(!outcome.degraded);

    let table = &outcome.tables[0].table;
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_names, vec!["排名", "商品", "佣金比例"]);
}

#[test]
fn test_process_tsv_auto_detect() {
    let content = "排名\t商品\t销量\n\
                   1\t美白面膜\t100\n\
                   2\t保湿口红\t200\n";
    let file = create_test_file(content, ".tsv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.source.format, "tsv");
    assert_eq!(outcome.tables[0].table.row_count(), 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Smelter::new()
        .process_path("no/such/file.csv")
        .expect_err("should fail for missing file");

    assert!(matches!(err, SmelterError::Io { .. }));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let file = create_test_file("whatever", ".docx");

    let err = Smelter::new()
        .process_path(file.path())
        .expect_err("should reject unsupported extension");

    assert!(matches!(err, SmelterError::UnsupportedFormat(_)));
}

#[test]
fn test_empty_file_is_rejected() {
    let file = create_test_file("", ".csv");

    let err = Smelter::new()
        .process_path(file.path())
        .expect_err("should reject empty file");

    assert!(matches!(err, SmelterError::EmptyDocument(_)));
}

// =============================================================================
// Encoding Resolution Tests
// =============================================================================

#[test]
fn test_gbk_file_decodes() {
    let (encoded, _, _) = encoding_rs::GBK.encode("排名,商品,销量\n1,美白面膜,100\n");
    let file = create_test_file_bytes(&encoded, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.source.encoding, "gbk");
    let table = &outcome.tables[0].table;
    assert_eq!(table.column_names[1], "商品");
    assert_eq!(table.rows[0][1], "美白面膜");
}

#[test]
fn test_utf8_bom_is_stripped() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("排名,商品,销量\n1,美白面膜,100\n".as_bytes());
    let file = create_test_file_bytes(&bytes, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.source.encoding, "utf-8-sig");
    assert_eq!(outcome.tables[0].table.column_names[0], "排名");
}

// =============================================================================
// Multi-Table Segmentation Tests
// =============================================================================

#[test]
fn test_multi_table_export_file() {
    let content = "蝉妈妈数据导出,,,\n\
                   导出时间：2024-05-01,,,\n\
                   ,,,\n\
                   抖音销量榜,,,\n\
                   排名,商品,销量,佣金比例\n\
                   1,美白面膜,2.5w,20%\n\
                   2,保湿口红,1.8w,15%\n\
                   ,,,\n\
                   商品库,,,\n\
                   排名,商品,近30天销量,转化率\n\
                   1,修护面霜,7.5w~10w,5%\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.tables.len(), 2);
    assert!(!outcome.degraded);

    let first = &outcome.tables[0].table;
    assert_eq!(first.name, "抖音销量榜");
    assert_eq!(first.column_names, vec!["排名", "商品", "销量", "佣金比例"]);
    // The stray title row of the next table stays in this body.
    assert_eq!(first.row_count(), 3);
    assert_eq!(first.rows[0][1], "美白面膜");
    assert_eq!(first.rows[2][0], "商品库");

    let second = &outcome.tables[1].table;
    assert_eq!(second.name, "商品库");
    assert_eq!(second.row_count(), 1);
    assert_eq!(second.rows[0][2], "7.5w~10w");

    let commission = first
        .derived
        .iter()
        .find(|d| d.name == "佣金比例_filter")
        .expect("commission filter column missing");
    assert_eq!(commission.values, vec![Some(0.2), Some(0.15), None]);

    let sales = second
        .derived
        .iter()
        .find(|d| d.name == "近30天销量_filter")
        .expect("sales filter column missing");
    assert_eq!(sales.values, vec![Some(75000.0)]);
}

#[test]
fn test_primary_table_prefers_known_names() {
    let content = "商品库,,,\n\
                   排名,商品,近30天销量,转化率\n\
                   1,修护面霜,7.5w~10w,5%\n\
                   ,,,\n\
                   抖音销量榜,,,\n\
                   排名,商品,销量,佣金比例\n\
                   1,美白面膜,2.5w,20%\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert_eq!(outcome.tables.len(), 2);
    let primary = outcome.primary_table().expect("no primary table");
    assert_eq!(primary.table.name, "抖音销量榜");
}

#[test]
fn test_headerless_sheet_degrades() {
    let content = "1,2,3,4\n\
                   5,6,7,8\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert!(outcome.degraded);
    assert_eq!(outcome.tables.len(), 1);
    assert_eq!(outcome.tables[0].table.row_count(), 1);
}

#[test]
fn test_header_only_sheet_yields_empty_table() {
    let content = "排名,商品,佣金比例\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    assert!(outcome.degraded);
    assert_eq!(outcome.tables.len(), 1);
    assert_eq!(outcome.tables[0].table.row_count(), 0);
}

// =============================================================================
// Fuzzy Number Normalization Tests
// =============================================================================

#[test]
fn test_fuzzy_range_produces_filter_column() {
    let content = "排名,商品,近30天销量\n\
                   1,美白面膜,7.5w~10w\n\
                   2,保湿口红,3000\n\
                   3,修护面霜,-\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    let table = &outcome.tables[0].table;
    let filter = table
        .derived
        .iter()
        .find(|d| d.name == "近30天销量_filter")
        .expect("filter column missing");

    assert_eq!(filter.source_column, "近30天销量");
    assert_eq!(filter.values, vec![Some(75000.0), Some(3000.0), None]);

    // Original values survive untouched.
    assert_eq!(table.rows[0][2], "7.5w~10w");
    assert_eq!(table.rows[2][2], "-");
}

#[test]
fn test_percentage_produces_filter_column() {
    let content = "排名,商品,佣金比例\n\
                   1,美白面膜,20%\n\
                   2,保湿口红,3.5%\n\
                   3,修护面霜,无\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    let table = &outcome.tables[0].table;
    let filter = table
        .derived
        .iter()
        .find(|d| d.name == "佣金比例_filter")
        .expect("filter column missing");

    assert_eq!(filter.values, vec![Some(0.2), Some(0.035), None]);
}

#[test]
fn test_unparsable_values_preserved() {
    let content = "排名,商品,近30天销量\n\
                   1,美白面膜,热卖中\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    let table = &outcome.tables[0].table;
    assert_eq!(table.rows[0][2], "热卖中");

    let filter = table
        .derived
        .iter()
        .find(|d| d.name == "近30天销量_filter")
        .expect("filter column missing");
    assert_eq!(filter.values, vec![None]);

    let csv = export::to_csv_string(table, &ExportOptions::default()).expect("CSV export failed");
    assert!(csv.contains("热卖中"));
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_csv_export_bom_and_filter_columns() {
    let content = "排名,商品,佣金比例\n\
                   1,美白面膜,20%\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");
    let table = &outcome.tables[0].table;

    let plain = export::to_csv_string(table, &ExportOptions::default()).expect("CSV export failed");
    assert!(plain.starts_with('\u{FEFF}'));
    assert!(plain.contains("佣金比例"));
    assert!(!plain.contains("_filter"));
    assert!(plain.contains("20%"));

    let with_filters = export::to_csv_string(
        table,
        &ExportOptions {
            include_filters: true,
        },
    )
    .expect("CSV export failed");
    assert!(with_filters.contains("佣金比例_filter"));
    assert!(with_filters.contains("0.2"));
}

#[test]
fn test_json_records_keep_value_types() {
    let content = "排名,商品,佣金比例\n\
                   1,美白面膜,20%\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");
    let table = &outcome.tables[0].table;

    let records = export::to_json_records(
        table,
        &ExportOptions {
            include_filters: true,
        },
    );
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record["排名"], serde_json::Value::String("1".to_string()));
    assert_eq!(record["佣金比例_filter"].as_f64(), Some(0.2));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_custom_role_creates_filter_column() {
    let content = "排名,商品,销量\n\
                   1,美白面膜,2.5w\n";

    // Default configuration treats 销量 as plain text.
    let file = create_test_file(content, ".csv");
    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");
    assert!(outcome.tables[0].table.derived.is_empty());

    // A custom role turns it into a fuzzy range column.
    let mut fields = FieldConfig::default();
    fields
        .column_roles
        .insert("销量".to_string(), ColumnRole::FuzzyRange);
    let smelter = Smelter::with_config(SmelterConfig {
        fields,
        ..SmelterConfig::default()
    });

    let outcome = smelter
        .process_path(file.path())
        .expect("Processing failed");
    let filter = &outcome.tables[0].table.derived[0];
    assert_eq!(filter.name, "销量_filter");
    assert_eq!(filter.values, vec![Some(25000.0)]);
}

#[test]
fn test_config_toml_roundtrip() {
    let config = FieldConfig::default();
    let file = create_test_file("", ".toml");
    config
        .save_to_file(file.path())
        .expect("Saving config failed");

    let loaded = FieldConfig::load_from_file(file.path()).expect("Loading config failed");
    assert_eq!(loaded.canonical_of("排名"), Some("rank"));
    assert_eq!(loaded.role_of("佣金比例"), ColumnRole::Percentage);
    assert_eq!(loaded.required_fields, config.required_fields);
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let content = "[field_mapping]\n\
                   \"自定义列\" = \"custom_field\"\n";
    let file = create_test_file(content, ".toml");

    let config = FieldConfig::load_from_file(file.path()).expect("Loading config failed");

    // The provided section replaces the default mapping wholesale.
    assert_eq!(config.canonical_of("自定义列"), Some("custom_field"));
    assert_eq!(config.canonical_of("排名"), None);

    // Absent sections keep their defaults.
    assert_eq!(config.role_of("佣金比例"), ColumnRole::Percentage);
    assert!(config.required_fields.contains(&"rank".to_string()));
}

#[test]
fn test_missing_required_fields_reported() {
    let content = "店铺,品牌,链接,分类\n\
                   美妆小店,国货之光,http://example.com/1,护肤\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    let table = &outcome.tables[0].table;
    assert!(table.missing_required.contains(&"rank".to_string()));
    assert!(table.missing_required.contains(&"product_title".to_string()));
}

// =============================================================================
// In-Memory Processing Tests
// =============================================================================

#[test]
fn test_process_bytes_with_name_hint() {
    let content = "排名,商品,销量\n1,美白面膜,100\n";

    let outcome = Smelter::new()
        .process_bytes(content.as_bytes(), "upload.csv")
        .expect("Processing failed");

    assert_eq!(outcome.source.file, "upload.csv");
    assert_eq!(outcome.source.format, "csv");
    assert_eq!(outcome.tables[0].table.row_count(), 1);
}

// =============================================================================
// Quality Report Tests
// =============================================================================

#[test]
fn test_quality_report_shape() {
    let content = "排名,商品,佣金比例\n\
                   1,美白面膜,20%\n\
                   2,保湿口红,-\n";
    let file = create_test_file(content, ".csv");

    let outcome = Smelter::new()
        .process_path(file.path())
        .expect("Processing failed");

    let report = &outcome.tables[0].report;
    assert_eq!(report.row_count, 2);
    // Three original columns plus the derived commission filter.
    assert_eq!(report.column_count, 4);
    assert!(report.per_column.contains_key("排名"));
    assert!(report.per_column.contains_key("佣金比例_filter"));

    let commission = &report.per_column["佣金比例"];
    assert_eq!(commission.null_count, 1);
    assert!((commission.null_rate - 0.5).abs() < f64::EPSILON);
}
