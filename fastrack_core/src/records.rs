//! Typed access to the persisted records.
//!
//! Each loader parses and validates one record. A record that fails either
//! step comes back as `Error::CorruptData` so callers can discard it.

use crate::store::{KeyValueStore, RecordKey};
use crate::{ActiveFast, CompletedFast, DailyLog, Error, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Journal entries keyed by calendar date
pub type JournalLogs = BTreeMap<NaiveDate, DailyLog>;

fn corrupt(key: RecordKey, reason: impl std::fmt::Display) -> Error {
    Error::CorruptData {
        key: key.as_str().to_string(),
        reason: reason.to_string(),
    }
}

pub fn load_active<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<ActiveFast>> {
    let key = RecordKey::ActiveFast;
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let active: ActiveFast = serde_json::from_str(&raw).map_err(|e| corrupt(key, e))?;
    active.plan.validate().map_err(|e| corrupt(key, e))?;
    Ok(Some(active))
}

/// Persist the active fast, or remove the record when `None`
pub fn save_active<S: KeyValueStore + ?Sized>(
    store: &mut S,
    active: Option<&ActiveFast>,
) -> Result<()> {
    match active {
        Some(active) => store.set(RecordKey::ActiveFast, &serde_json::to_string(active)?),
        None => store.remove(RecordKey::ActiveFast),
    }
}

/// Completed fasts read from storage, plus how many entries were unusable
#[derive(Clone, Debug, Default)]
pub struct LoadedHistory {
    pub fasts: Vec<CompletedFast>,
    pub skipped: usize,
}

/// Load the completed-fast history, newest first
pub fn load_history<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<CompletedFast>> {
    load_history_entries(store).map(|loaded| loaded.fasts)
}

/// Load the history and report entries that had to be left out
///
/// A document that is not a JSON array is corrupt as a whole. An entry whose
/// stored duration disagrees with its timestamps is kept with the duration
/// recomputed. Entries that fail to parse or end before they start are
/// skipped with a warning and counted in `skipped`.
pub fn load_history_entries<S: KeyValueStore + ?Sized>(store: &S) -> Result<LoadedHistory> {
    let key = RecordKey::FastingHistory;
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => return Ok(LoadedHistory::default()),
    };

    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&raw).map_err(|e| corrupt(key, e))?;

    let mut loaded = LoadedHistory {
        fasts: Vec::with_capacity(entries.len()),
        skipped: 0,
    };
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = serde_json::from_value::<CompletedFast>(entry)
            .map_err(Error::from)
            .and_then(|mut fast| {
                if let Some(stored) = fast.reconcile_duration() {
                    tracing::warn!(
                        "History entry {} stored {}s; using {}s from its timestamps",
                        index,
                        stored,
                        fast.duration_seconds
                    );
                }
                fast.validate().map(|_| fast)
            });
        match parsed {
            Ok(fast) => loaded.fasts.push(fast),
            Err(e) => {
                tracing::warn!("Skipping history entry {}: {}", index, e);
                loaded.skipped += 1;
            }
        }
    }

    tracing::debug!(
        "Loaded {} completed fasts ({} skipped)",
        loaded.fasts.len(),
        loaded.skipped
    );
    Ok(loaded)
}

pub fn save_history<S: KeyValueStore + ?Sized>(
    store: &mut S,
    history: &[CompletedFast],
) -> Result<()> {
    store.set(RecordKey::FastingHistory, &serde_json::to_string(history)?)
}

/// Load journal entries
///
/// An entry whose `date` field disagrees with its key is re-keyed under
/// the key, since the key is the record's identity. Metric values outside
/// their valid range are dropped with a warning.
pub fn load_journal<S: KeyValueStore + ?Sized>(store: &S) -> Result<JournalLogs> {
    let key = RecordKey::JournalLogs;
    let raw = match store.get(key)? {
        Some(raw) => raw,
        None => return Ok(JournalLogs::new()),
    };

    let mut logs: JournalLogs = serde_json::from_str(&raw).map_err(|e| corrupt(key, e))?;
    for (date, log) in logs.iter_mut() {
        if log.date != *date {
            tracing::warn!(
                "Journal entry stored under {} claims date {}; using {}",
                date,
                log.date,
                date
            );
            log.date = *date;
        }
        for name in log.drop_out_of_range() {
            tracing::warn!("Ignoring out-of-range {} in journal entry for {}", name, date);
        }
    }

    tracing::debug!("Loaded {} journal entries", logs.len());
    Ok(logs)
}

pub fn save_journal<S: KeyValueStore + ?Sized>(store: &mut S, logs: &JournalLogs) -> Result<()> {
    store.set(RecordKey::JournalLogs, &serde_json::to_string(logs)?)
}
