//! Clean command - extract, normalize, and export tables from one file.

use std::path::{Path, PathBuf};

use colored::Colorize;
use smelter::{
    export, CleanedTable, ExportOptions, FieldConfig, ProcessedTable, Smelter, SmelterConfig,
    SmelterError,
};

use crate::cli::OutputFormat;

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    force: bool,
    no_quality_report: bool,
    include_filters: bool,
    strict: bool,
    config: Option<PathBuf>,
    all_tables: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let fields = match &config {
        Some(path) => FieldConfig::load_from_file(path)?,
        None => FieldConfig::default(),
    };

    println!(
        "{} {}",
        "Cleaning".cyan().bold(),
        file.display().to_string().white()
    );

    let smelter = Smelter::with_config(SmelterConfig {
        fields,
        ..SmelterConfig::default()
    });
    let outcome = smelter.process_path(&file)?;

    if outcome.degraded {
        println!(
            "{} no header row recognized; falling back to whole-sheet extraction",
            "Warning:".yellow().bold()
        );
    }

    let selected: Vec<&ProcessedTable> = if all_tables {
        outcome.tables.iter().collect()
    } else {
        outcome
            .primary_table()
            .or_else(|| outcome.tables.first())
            .into_iter()
            .collect()
    };

    if selected.is_empty() {
        return Err(format!("No tables found in {}", file.display()).into());
    }

    if strict {
        for processed in &selected {
            let table = &processed.table;
            if !table.missing_required.is_empty() {
                return Err(Box::new(SmelterError::MissingRequiredFields {
                    table: table.name.clone(),
                    fields: table.missing_required.clone(),
                }));
            }
        }
    } else {
        for processed in &selected {
            let table = &processed.table;
            if !table.missing_required.is_empty() {
                println!(
                    "{} table '{}' is missing required fields: {}",
                    "Warning:".yellow().bold(),
                    table.name,
                    table.missing_required.join(", ").yellow()
                );
            }
        }
    }

    let ext = format.extension();
    let base = output.unwrap_or_else(|| {
        let stem = file.file_stem().unwrap_or_default().to_string_lossy();
        file.with_file_name(format!("{}_cleaned.{}", stem, ext))
    });

    let options = ExportOptions { include_filters };

    let mut written: Vec<PathBuf> = Vec::new();
    if selected.len() == 1 {
        write_table(&selected[0].table, &base, &format, &options, force)?;
        written.push(base.clone());
    } else {
        let stem = base
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        for processed in &selected {
            let path = base.with_file_name(format!(
                "{}_{}.{}",
                stem,
                sanitize_table_name(&processed.table.name),
                ext
            ));
            write_table(&processed.table, &path, &format, &options, force)?;
            written.push(path);
        }
    }

    if !no_quality_report {
        for processed in &selected {
            print_quality_report(processed);
        }
    }

    println!();
    for path in &written {
        println!(
            "{} {}",
            "Saved".green().bold(),
            path.display().to_string().white()
        );
    }

    if verbose {
        for processed in &selected {
            let table = &processed.table;
            println!(
                "  {} {} rows, {} columns exported",
                table.name.cyan(),
                table.row_count().to_string().white(),
                table
                    .output_columns(include_filters)
                    .len()
                    .to_string()
                    .white()
            );
        }
    }

    Ok(())
}

fn write_table(
    table: &CleanedTable,
    path: &Path,
    format: &OutputFormat,
    options: &ExportOptions,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "Output file already exists: {}. Use --force to overwrite.",
            path.display()
        )
        .into());
    }
    match format {
        OutputFormat::Csv => export::write_csv(table, path, options)?,
        OutputFormat::Json => export::write_json(table, path, options)?,
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => export::write_parquet(table, path, options)?,
    }
    Ok(())
}

fn print_quality_report(processed: &ProcessedTable) {
    let report = &processed.report;
    println!();
    println!(
        "{} {}",
        "Quality report:".yellow().bold(),
        report.table_name.white()
    );
    println!(
        "  {} rows, {} columns",
        report.row_count.to_string().white(),
        report.column_count.to_string().white()
    );
    for (name, quality) in &report.per_column {
        let mut line = format!(
            "  {:<24} nulls {:>5.1}%  {}",
            name,
            quality.null_rate * 100.0,
            quality.inferred_type
        );
        if let Some(conformance) = quality.conformance {
            line.push_str(&format!("  conforms {:>5.1}%", conformance * 100.0));
        }
        println!("{}", line);
    }
}

/// Make a table name safe to embed in an output file name.
fn sanitize_table_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
