//! CSV export for session records.
//!
//! Flattens ledger records into a CSV archive so an ended session can be
//! kept outside the snapshot. Appends to an existing archive, writing the
//! header row only when the file is empty.

use crate::types::ConsumptionRecord;
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: u64,
    drink_id: String,
    portion: f64,
    recorded_at: String,
}

impl From<&ConsumptionRecord> for CsvRow {
    fn from(record: &ConsumptionRecord) -> Self {
        CsvRow {
            id: record.id,
            drink_id: record.drink_id.clone(),
            portion: record.portion,
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// Append records to a CSV archive and return how many were written.
///
/// Records arrive ledger-ordered (most recent first) and are written
/// oldest-first so the archive reads chronologically. The CSV is fsynced
/// before returning.
pub fn export_records(csv_path: &Path, records: &[ConsumptionRecord]) -> Result<usize> {
    if records.is_empty() {
        tracing::info!("No records to export");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is fresh
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in records.iter().rev() {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} records to {:?}", records.len(), csv_path);
    Ok(records.len())
}
