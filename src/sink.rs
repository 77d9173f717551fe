//! Append-only per-fiscal-year CSV output.
//!
//! Each fiscal year gets its own file under the output directory. The header
//! row is written exactly once, decided by whether the file already exists at
//! first open, so re-running against an existing directory keeps appending.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::models::RatioRecord;

pub struct YearlyCsvSink {
    out_dir: PathBuf,
    prefix: String,
    // One cached writer per year; the lock serializes concurrent appends.
    writers: Mutex<HashMap<i32, csv::Writer<File>>>,
}

impl YearlyCsvSink {
    pub fn new(out_dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

        Ok(Self {
            out_dir,
            prefix: prefix.to_string(),
            writers: Mutex::new(HashMap::new()),
        })
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.out_dir.join(format!("{}_{}.csv", self.prefix, year))
    }

    /// Append one record to its year's file, creating the file (with header)
    /// on first use.
    pub fn append(&self, record: &RatioRecord) -> Result<()> {
        let mut writers = self.writers.lock().unwrap();

        if !writers.contains_key(&record.year) {
            let path = self.path_for(record.year);
            let needs_header = !path.exists();
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let writer = csv::WriterBuilder::new()
                .has_headers(needs_header)
                .from_writer(file);
            writers.insert(record.year, writer);
            debug!("Opened yearly output file {}", path.display());
        }

        let writer = writers
            .get_mut(&record.year)
            .expect("writer inserted above");
        writer
            .serialize(record)
            .with_context(|| format!("failed to append record for {} {}", record.code, record.year))?;
        writer.flush()?;
        Ok(())
    }

    /// Years this sink has written to so far.
    pub fn years_written(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.writers.lock().unwrap().keys().copied().collect();
        years.sort_unstable();
        years
    }
}
