//! CSV export of the fasting history and the journal.
//!
//! Each export writes a fresh file through a temp file in the target
//! directory and renames it into place, so a failed export never leaves a
//! half-written CSV behind.

use crate::records::JournalLogs;
use crate::{CompletedFast, DailyLog, Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the history CSV
#[derive(Debug, serde::Serialize)]
struct HistoryRow {
    start_time: String,
    end_time: String,
    plan: String,
    target_hours: f64,
    duration_seconds: u64,
    achieved_percent: String,
}

impl From<&CompletedFast> for HistoryRow {
    fn from(fast: &CompletedFast) -> Self {
        HistoryRow {
            start_time: fast.start_time().to_rfc3339(),
            end_time: fast.end_time.to_rfc3339(),
            plan: fast.plan().name.clone(),
            target_hours: fast.plan().target_hours,
            duration_seconds: fast.duration_seconds,
            achieved_percent: format!("{:.1}", fast.achieved_percent()),
        }
    }
}

/// A row in the journal CSV
#[derive(Debug, serde::Serialize)]
struct JournalRow {
    date: String,
    water_units: Option<u32>,
    weight: Option<f64>,
    chest: Option<f64>,
    waist: Option<f64>,
    hips: Option<f64>,
    thigh: Option<f64>,
    ketones: Option<f64>,
    glucose: Option<f64>,
    sodium: Option<f64>,
    potassium: Option<f64>,
    magnesium: Option<f64>,
}

impl From<&DailyLog> for JournalRow {
    fn from(log: &DailyLog) -> Self {
        let m = log.measurements.clone().unwrap_or_default();
        let b = log.blood_levels.clone().unwrap_or_default();
        let e = log.electrolytes.clone().unwrap_or_default();
        JournalRow {
            date: log.date.format("%Y-%m-%d").to_string(),
            water_units: log.water_intake_units,
            weight: log.weight,
            chest: m.chest,
            waist: m.waist,
            hips: m.hips,
            thigh: m.thigh,
            ketones: b.ketones,
            glucose: b.glucose,
            sodium: e.sodium,
            potassium: e.potassium,
            magnesium: e.magnesium,
        }
    }
}

/// Write the history (newest first) to `csv_path`; returns the row count
pub fn export_history_csv(history: &[CompletedFast], csv_path: &Path) -> Result<usize> {
    write_rows(csv_path, history.iter().map(HistoryRow::from))?;
    tracing::info!("Exported {} fasts to {:?}", history.len(), csv_path);
    Ok(history.len())
}

/// Write journal entries in date order to `csv_path`; returns the row count
pub fn export_journal_csv(logs: &JournalLogs, csv_path: &Path) -> Result<usize> {
    write_rows(csv_path, logs.values().map(JournalRow::from))?;
    tracing::info!("Exported {} journal entries to {:?}", logs.len(), csv_path);
    Ok(logs.len())
}

fn write_rows<R, I>(csv_path: &Path, rows: I) -> Result<()>
where
    R: serde::Serialize,
    I: IntoIterator<Item = R>,
{
    let dir = match csv_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
