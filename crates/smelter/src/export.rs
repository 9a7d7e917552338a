//! Exporters for cleaned tables: CSV, JSON records, optional Parquet.
//!
//! CSV output leads with a UTF-8 BOM so Excel opens CJK headers
//! correctly. Derived `_filter` columns are stripped by default and
//! appended only on request; stripping is structural (the derived list),
//! so an original column that happens to end in `_filter` survives.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Result, SmelterError};
use crate::normalize::CleanedTable;

/// UTF-8 byte-order mark, for spreadsheet-friendly CSV.
const BOM: &str = "\u{FEFF}";

/// Options shared by all exporters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Append derived `_filter` columns to the output.
    pub include_filters: bool,
}

/// Render a table as a BOM-prefixed CSV string.
pub fn to_csv_string(table: &CleanedTable, options: &ExportOptions) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_csv_records(&mut writer, table, options)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| SmelterError::Export(format!("CSV buffer: {}", e)))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| SmelterError::Export(format!("CSV buffer not UTF-8: {}", e)))?;
    Ok(format!("{}{}", BOM, body))
}

/// Write a table to a CSV file with a UTF-8 BOM.
pub fn write_csv(table: &CleanedTable, path: &Path, options: &ExportOptions) -> Result<()> {
    let mut file = File::create(path).map_err(|source| SmelterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(BOM.as_bytes())
        .map_err(|source| SmelterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let mut writer = csv::Writer::from_writer(file);
    write_csv_records(&mut writer, table, options)?;
    writer.flush().map_err(|source| SmelterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn write_csv_records<W: Write>(
    writer: &mut csv::Writer<W>,
    table: &CleanedTable,
    options: &ExportOptions,
) -> Result<()> {
    writer.write_record(table.output_columns(options.include_filters))?;
    for (i, row) in table.rows.iter().enumerate() {
        let mut record: Vec<String> = row.clone();
        if options.include_filters {
            for derived in &table.derived {
                record.push(
                    derived.values[i]
                        .map(render_float)
                        .unwrap_or_default(),
                );
            }
        }
        writer.write_record(&record)?;
    }
    Ok(())
}

/// Render a table as JSON records, one object per row with keys in
/// column order. Original values stay strings; derived values are
/// numbers or null.
pub fn to_json_records(
    table: &CleanedTable,
    options: &ExportOptions,
) -> Vec<IndexMap<String, serde_json::Value>> {
    let mut records = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let mut record = IndexMap::new();
        for (name, value) in table.column_names.iter().zip(row) {
            record.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        if options.include_filters {
            for derived in &table.derived {
                let value = derived.values[i]
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null);
                record.insert(derived.name.clone(), value);
            }
        }
        records.push(record);
    }
    records
}

/// Write a table to a pretty-printed JSON file.
pub fn write_json(table: &CleanedTable, path: &Path, options: &ExportOptions) -> Result<()> {
    let file = File::create(path).map_err(|source| SmelterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, &to_json_records(table, options))?;
    Ok(())
}

/// Write a table to a Parquet file: Utf8 originals, Float64 derived.
#[cfg(feature = "parquet")]
pub fn write_parquet(table: &CleanedTable, path: &Path, options: &ExportOptions) -> Result<()> {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (j, name) in table.column_names.iter().enumerate() {
        fields.push(Field::new(name.as_str(), DataType::Utf8, false));
        let values: Vec<&str> = table
            .rows
            .iter()
            .map(|row| row.get(j).map(String::as_str).unwrap_or(""))
            .collect();
        arrays.push(Arc::new(StringArray::from(values)));
    }
    if options.include_filters {
        for derived in &table.derived {
            fields.push(Field::new(derived.name.as_str(), DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(derived.values.clone())));
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path).map_err(|source| SmelterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Integral floats render without a decimal point, matching how cells
/// are stringified at load time.
fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
