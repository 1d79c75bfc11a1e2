//! On-disk storage for the run's result record.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::record::ResultRecord;

/// The record file shared with the planning engine.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh record, replacing whatever was at the path.
    pub fn initialize(&self, record: &ResultRecord) -> Result<()> {
        debug!(path = %self.path.display(), "initialising result record");
        self.save(record)
    }

    pub fn load(&self) -> Result<ResultRecord> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read result record {}", self.path.display()))?;
        ResultRecord::parse(&contents)
            .with_context(|| format!("parse result record {}", self.path.display()))
    }

    /// Atomically write the full record (temp file + rename).
    pub fn save(&self, record: &ResultRecord) -> Result<()> {
        write_atomic(&self.path, &record.render())
    }

    /// Read-modify-write a single field by header name.
    ///
    /// Fails if the file cannot be parsed or `name` is not a header; the field set is fixed, so an
    /// unknown name is a programming error.
    pub fn update_field(&self, name: &str, value: &str) -> Result<ResultRecord> {
        let mut record = self.load()?;
        record.set_named(name, value)?;
        debug!(path = %self.path.display(), field = name, value, "updating result record");
        self.save(&record)?;
        Ok(record)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("csv.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp result record {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace result record {}", path.display()))?;
    Ok(())
}
