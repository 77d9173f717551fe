//! Company-list input handling: read the ticker column out of a delimited
//! file, and split a large list into fixed-size part files.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Read company codes from the named column of a CSV file. Blank cells are
/// skipped; `limit` caps the number of codes returned.
pub fn load_company_codes(path: &Path, column: &str, limit: Option<usize>) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open company list {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| anyhow!("the input CSV must have a '{}' column", column))?;

    let mut codes = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(code) = record.get(index) {
            let code = code.trim();
            if !code.is_empty() {
                codes.push(code.to_string());
            }
        }
        if limit.is_some_and(|l| codes.len() >= l) {
            break;
        }
    }

    info!("Loaded {} company codes from {}", codes.len(), path.display());
    Ok(codes)
}

/// Split a company list into part files of `rows_per_file` rows each,
/// preserving the header. Parts are written next to the input as
/// `<stem>_part_<n>.csv`.
pub fn split_universe(path: &Path, rows_per_file: usize) -> Result<Vec<PathBuf>> {
    if rows_per_file == 0 {
        return Err(anyhow!("rows_per_file must be at least 1"));
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open company list {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("input path has no file name: {}", path.display()))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut outputs = Vec::new();
    for (i, chunk) in records.chunks(rows_per_file).enumerate() {
        let out_path = parent.join(format!("{}_part_{}.csv", stem, i + 1));
        let mut writer = csv::Writer::from_path(&out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        writer.write_record(&headers)?;
        for record in chunk {
            writer.write_record(record)?;
        }
        writer.flush()?;
        outputs.push(out_path);
    }

    info!(
        "Split {} rows into {} part files",
        records.len(),
        outputs.len()
    );
    Ok(outputs)
}
