//! Clean one yearly output file for regression: drop rows with missing or
//! non-finite numeric fields, drop duplicate company codes (first row wins),
//! and write the result as `cleaned_<name>` next to the input.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

const COMPANY_CODE_COLUMN: &str = "Company code";

// Text columns are exempt from the finite-number check.
const TEXT_COLUMNS: &[&str] = &["Company code", "Company Name", "Sector", "Industry"];

fn is_unusable(field: &str) -> bool {
    if field.is_empty() {
        return true;
    }
    match field.parse::<f64>() {
        Ok(v) => !v.is_finite(),
        // Yearly files only hold numbers in non-text columns; anything
        // unparseable is provider junk
        Err(_) => true,
    }
}

/// Clean a yearly ratios file and return the path written.
pub fn clean_yearly_file(input: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("input path has no file name: {}", input.display()))?;
    let output = input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("cleaned_{}", file_name));

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let headers = reader.headers()?.clone();

    let code_index = headers
        .iter()
        .position(|h| h == COMPANY_CODE_COLUMN)
        .ok_or_else(|| anyhow!("missing '{}' column in {}", COMPANY_CODE_COLUMN, input.display()))?;
    let numeric_indexes: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !TEXT_COLUMNS.contains(h))
        .map(|(i, _)| i)
        .collect();

    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    writer.write_record(&headers)?;

    let mut seen_codes = HashSet::new();
    let mut kept = 0usize;
    let mut dropped = 0usize;

    for result in reader.records() {
        let record = result?;

        let unusable = numeric_indexes
            .iter()
            .any(|&i| is_unusable(record.get(i).unwrap_or("")));
        let duplicate = !seen_codes.insert(record.get(code_index).unwrap_or("").to_string());

        if unusable || duplicate {
            dropped += 1;
            continue;
        }
        writer.write_record(&record)?;
        kept += 1;
    }
    writer.flush()?;

    info!(
        "Cleaned {}: kept {} rows, dropped {} -> {}",
        input.display(),
        kept,
        dropped,
        output.display()
    );
    Ok(output)
}
