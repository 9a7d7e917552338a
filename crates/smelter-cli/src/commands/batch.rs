//! Batch command - clean every matching file in a directory.

use std::path::{Path, PathBuf};

use colored::Colorize;
use rayon::prelude::*;
use smelter::{export, ExportOptions, FieldConfig, Smelter, SmelterConfig, SmelterError};

use crate::cli::OutputFormat;

pub fn run(
    dir: PathBuf,
    workers: usize,
    pattern: String,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Directory not found: {}", dir.display()).into());
    }

    let workers = workers.clamp(1, 8);

    let glob_pattern = dir.join(&pattern);
    let files: Vec<PathBuf> = glob::glob(&glob_pattern.to_string_lossy())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();

    if files.is_empty() {
        return Err(format!("No files match '{}' in {}", pattern, dir.display()).into());
    }
    tracing::debug!("matched {} file(s) for pattern '{}'", files.len(), pattern);

    let fields = match &config {
        Some(path) => FieldConfig::load_from_file(path)?,
        None => FieldConfig::default(),
    };
    let smelter = Smelter::with_config(SmelterConfig {
        fields,
        ..SmelterConfig::default()
    });

    let out_dir = output_dir.unwrap_or_else(|| dir.join("cleaned"));
    std::fs::create_dir_all(&out_dir)?;

    println!(
        "{} {} file(s) with {} worker(s)",
        "Cleaning".cyan().bold(),
        files.len().to_string().white().bold(),
        workers.to_string().white()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;
    let results: Vec<(PathBuf, Result<PathBuf, String>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result =
                    clean_one(&smelter, path, &out_dir, &format).map_err(|e| e.to_string());
                (path.clone(), result)
            })
            .collect()
    });

    let mut cleaned = 0;
    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok(out_path) => {
                cleaned += 1;
                if verbose {
                    println!(
                        "  {} {} -> {}",
                        "ok".green(),
                        path.display(),
                        out_path.display()
                    );
                }
            }
            Err(message) => {
                failed += 1;
                eprintln!("  {} {}: {}", "failed".red(), path.display(), message);
            }
        }
    }

    println!();
    println!(
        "{} {} cleaned, {} failed",
        "Done:".green().bold(),
        cleaned.to_string().white().bold(),
        failed.to_string().red()
    );

    if cleaned == 0 {
        return Err("all files failed to clean".into());
    }

    Ok(())
}

fn clean_one(
    smelter: &Smelter,
    path: &Path,
    out_dir: &Path,
    format: &OutputFormat,
) -> Result<PathBuf, SmelterError> {
    let outcome = smelter.process_path(path)?;
    let processed = outcome
        .primary_table()
        .or_else(|| outcome.tables.first())
        .ok_or_else(|| SmelterError::EmptyDocument(path.display().to_string()))?;

    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let out_path = out_dir.join(format!("{}_cleaned.{}", stem, format.extension()));

    let options = ExportOptions::default();
    match format {
        OutputFormat::Csv => export::write_csv(&processed.table, &out_path, &options)?,
        OutputFormat::Json => export::write_json(&processed.table, &out_path, &options)?,
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => export::write_parquet(&processed.table, &out_path, &options)?,
    }

    Ok(out_path)
}
