//! Raw dataset download, cleaning and snapshot persistence

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::types::record::{RawRecord, Record, FEATURE_COUNT};

/// Marker used by the source for unknown values
const MISSING_MARKER: &str = "?";

/// Downloads the raw dataset and produces the cleaned snapshot.
pub struct DataPreparer {
    config: DataConfig,
}

impl DataPreparer {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    /// Fetch the raw records and persist the raw snapshot.
    ///
    /// Fails if the source is unreachable or answers with a non-success status.
    pub async fn download(&self) -> Result<Vec<RawRecord>> {
        let url = &self.config.source_url;
        info!(url = %url, "Downloading raw dataset");

        let body = reqwest::get(url)
            .await
            .with_context(|| format!("Failed to reach dataset source {url}"))?
            .error_for_status()
            .with_context(|| format!("Dataset source {url} returned an error status"))?
            .text()
            .await
            .context("Failed to read dataset body")?;

        let raw = parse_raw(&body)?;
        write_csv(&self.config.raw_path, &raw)?;

        info!(
            rows = raw.len(),
            path = %self.config.raw_path.display(),
            "Raw dataset downloaded"
        );
        Ok(raw)
    }

    /// Clean raw records and persist the cleaned snapshot.
    pub fn clean(&self, raw: &[RawRecord]) -> Result<Vec<Record>> {
        let records = clean_records(raw);
        write_csv(&self.config.clean_path, &records)?;

        let positives = records.iter().filter(|r| r.target == 1).count();
        info!(
            rows = records.len(),
            dropped = raw.len() - records.len(),
            positive = positives,
            negative = records.len() - positives,
            path = %self.config.clean_path.display(),
            "Dataset cleaned"
        );
        Ok(records)
    }

    /// Read the cleaned snapshot back.
    pub fn load_clean(&self) -> Result<Vec<Record>> {
        load_clean(&self.config.clean_path)
    }
}

/// Parse the header-less source CSV, naming the 14 columns.
pub fn parse_raw(body: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed CSV at line {}", line + 1))?;
        if row.len() != FEATURE_COUNT + 1 {
            bail!(
                "Line {} has {} columns, expected {}",
                line + 1,
                row.len(),
                FEATURE_COUNT + 1
            );
        }

        let mut columns = [None; FEATURE_COUNT + 1];
        for (slot, field) in columns.iter_mut().zip(row.iter()) {
            *slot = parse_field(field)
                .with_context(|| format!("Invalid value {field:?} at line {}", line + 1))?;
        }
        records.push(RawRecord::from_columns(columns));
    }

    debug!(rows = records.len(), "Parsed raw dataset");
    Ok(records)
}

fn parse_field(field: &str) -> Result<Option<f64>> {
    if field.is_empty() || field == MISSING_MARKER {
        return Ok(None);
    }
    Ok(Some(field.parse::<f64>()?))
}

/// Drop incomplete rows and binarize the label.
pub fn clean_records(raw: &[RawRecord]) -> Vec<Record> {
    raw.iter().filter_map(Record::from_raw).collect()
}

/// Load a cleaned snapshot.
pub fn load_clean<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open cleaned dataset {}", path.display()))?;

    let records = reader
        .deserialize()
        .collect::<Result<Vec<Record>, _>>()
        .with_context(|| format!("Failed to parse cleaned dataset {}", path.display()))?;

    if records.is_empty() {
        bail!("Cleaned dataset {} is empty", path.display());
    }
    Ok(records)
}

/// Load a raw snapshot written by [`DataPreparer::download`].
pub fn load_raw<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open raw dataset {}", path.display()))?;

    reader
        .deserialize()
        .collect::<Result<Vec<RawRecord>, _>>()
        .with_context(|| format!("Failed to parse raw dataset {}", path.display()))
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
