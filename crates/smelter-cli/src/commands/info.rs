//! Info command - inspect an export file without cleaning it.

use std::path::PathBuf;

use colored::Colorize;
use smelter::Smelter;

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let outcome = Smelter::new().process_path(&file)?;
    let source = &outcome.source;

    if json_output {
        let tables: Vec<serde_json::Value> = outcome
            .tables
            .iter()
            .map(|processed| {
                serde_json::json!({
                    "name": processed.table.name,
                    "rows": processed.table.row_count(),
                    "columns": processed.table.column_count(),
                    "column_names": processed.table.column_names,
                    "missing_required": processed.table.missing_required,
                })
            })
            .collect();
        let info = serde_json::json!({
            "file": source.file,
            "format": source.format,
            "encoding": source.encoding,
            "size_bytes": source.size_bytes,
            "sheet_count": source.sheet_count,
            "degraded": outcome.degraded,
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Inspecting".cyan().bold(),
        file.display().to_string().white()
    );

    println!();
    println!("  Format:   {}", source.format.white());
    println!("  Encoding: {}", source.encoding.white());
    println!("  Size:     {:.1} KB", source.size_bytes as f64 / 1024.0);
    println!("  Sheets:   {}", source.sheet_count.to_string().white());
    println!(
        "  Tables:   {}",
        outcome.tables.len().to_string().white().bold()
    );

    if outcome.degraded {
        println!();
        println!(
            "{} no header row recognized; whole-sheet fallback was used",
            "Warning:".yellow().bold()
        );
    }

    for processed in &outcome.tables {
        let table = &processed.table;
        println!();
        println!("{}", table.name.green().bold());
        println!(
            "  {} rows x {} columns",
            table.row_count().to_string().white().bold(),
            table.column_count().to_string().white().bold()
        );

        let preview: Vec<&str> = table
            .column_names
            .iter()
            .take(5)
            .map(String::as_str)
            .collect();
        let suffix = if table.column_names.len() > 5 { ", ..." } else { "" };
        println!("  Columns: {}{}", preview.join(", "), suffix);

        if !table.missing_required.is_empty() {
            println!(
                "  {} missing required fields: {}",
                "Warning:".yellow().bold(),
                table.missing_required.join(", ").yellow()
            );
        }

        if verbose {
            println!("  {}", "Column quality:".yellow().bold());
            for (name, quality) in &processed.report.per_column {
                println!(
                    "    {:<24} nulls {:>5.1}%  {}",
                    name,
                    quality.null_rate * 100.0,
                    quality.inferred_type
                );
            }
        }
    }

    Ok(())
}
