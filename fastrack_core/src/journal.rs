//! Daily health journal.
//!
//! One entry per calendar date, upserted and persisted on every write.
//! Partial metric groups merge into what is already stored for the day.

use crate::records::{self, JournalLogs};
use crate::store::{KeyValueStore, RecordKey};
use crate::types::{is_non_negative, is_positive};
use crate::{BloodLevels, BodyMeasurements, DailyLog, Electrolytes, Error, Result};
use chrono::{Duration, NaiveDate};

/// Journal values that can be charted over time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JournalMetric {
    Water,
    Weight,
    Chest,
    Waist,
    Hips,
    Thigh,
    Ketones,
    Glucose,
    Sodium,
    Potassium,
    Magnesium,
}

impl JournalMetric {
    fn value(&self, log: &DailyLog) -> Option<f64> {
        let m = log.measurements.as_ref();
        let b = log.blood_levels.as_ref();
        let e = log.electrolytes.as_ref();
        match self {
            JournalMetric::Water => log.water_intake_units.map(f64::from),
            JournalMetric::Weight => log.weight,
            JournalMetric::Chest => m.and_then(|m| m.chest),
            JournalMetric::Waist => m.and_then(|m| m.waist),
            JournalMetric::Hips => m.and_then(|m| m.hips),
            JournalMetric::Thigh => m.and_then(|m| m.thigh),
            JournalMetric::Ketones => b.and_then(|b| b.ketones),
            JournalMetric::Glucose => b.and_then(|b| b.glucose),
            JournalMetric::Sodium => e.and_then(|e| e.sodium),
            JournalMetric::Potassium => e.and_then(|e| e.potassium),
            JournalMetric::Magnesium => e.and_then(|e| e.magnesium),
        }
    }
}

pub struct Journal<S: KeyValueStore> {
    store: S,
    logs: JournalLogs,
}

impl<S: KeyValueStore> Journal<S> {
    /// Load the journal, discarding a corrupt record with a warning
    pub fn open(mut store: S) -> Result<Self> {
        let logs = match records::load_journal(&store) {
            Ok(logs) => logs,
            Err(e) if e.is_corrupt_data() => {
                tracing::warn!("{}. Starting with an empty journal.", e);
                store.discard(RecordKey::JournalLogs)?;
                JournalLogs::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self { store, logs })
    }

    pub fn logs(&self) -> &JournalLogs {
        &self.logs
    }

    /// The stored entry for `date`, or an empty one
    pub fn entry(&self, date: NaiveDate) -> DailyLog {
        self.logs
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyLog::empty(date))
    }

    /// Add one unit of water
    pub fn add_water(&mut self, date: NaiveDate) -> Result<DailyLog> {
        self.upsert(date, |log| {
            log.water_intake_units = Some(log.water_units().saturating_add(1));
            Ok(())
        })
    }

    /// Remove one unit of water; no write when the day is already at zero
    pub fn remove_water(&mut self, date: NaiveDate) -> Result<DailyLog> {
        let current = self.entry(date);
        if current.water_units() == 0 {
            return Ok(current);
        }
        self.upsert(date, |log| {
            log.water_intake_units = Some(log.water_units() - 1);
            Ok(())
        })
    }

    pub fn record_weight(&mut self, date: NaiveDate, weight: f64) -> Result<DailyLog> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::Validation(format!(
                "weight must be a positive number, got {}",
                weight
            )));
        }
        self.upsert(date, |log| {
            log.weight = Some(weight);
            Ok(())
        })
    }

    pub fn record_measurements(
        &mut self,
        date: NaiveDate,
        update: BodyMeasurements,
    ) -> Result<DailyLog> {
        for (name, value) in [
            ("chest", update.chest),
            ("waist", update.waist),
            ("hips", update.hips),
            ("thigh", update.thigh),
        ] {
            check_positive(name, value)?;
        }
        self.upsert(date, |log| {
            let m = log.measurements.get_or_insert_with(BodyMeasurements::default);
            merge(&mut m.chest, update.chest);
            merge(&mut m.waist, update.waist);
            merge(&mut m.hips, update.hips);
            merge(&mut m.thigh, update.thigh);
            Ok(())
        })
    }

    pub fn record_blood_levels(&mut self, date: NaiveDate, update: BloodLevels) -> Result<DailyLog> {
        check_non_negative("ketones", update.ketones)?;
        check_non_negative("glucose", update.glucose)?;
        self.upsert(date, |log| {
            let b = log.blood_levels.get_or_insert_with(BloodLevels::default);
            merge(&mut b.ketones, update.ketones);
            merge(&mut b.glucose, update.glucose);
            Ok(())
        })
    }

    pub fn record_electrolytes(
        &mut self,
        date: NaiveDate,
        update: Electrolytes,
    ) -> Result<DailyLog> {
        check_non_negative("sodium", update.sodium)?;
        check_non_negative("potassium", update.potassium)?;
        check_non_negative("magnesium", update.magnesium)?;
        self.upsert(date, |log| {
            let e = log.electrolytes.get_or_insert_with(Electrolytes::default);
            merge(&mut e.sodium, update.sodium);
            merge(&mut e.potassium, update.potassium);
            merge(&mut e.magnesium, update.magnesium);
            Ok(())
        })
    }

    /// Seven entries centred on `date` (three days either side)
    ///
    /// Days that fall outside the representable calendar are left out.
    pub fn week_around(&self, date: NaiveDate) -> Vec<DailyLog> {
        (-3..=3)
            .filter_map(|offset| date.checked_add_signed(Duration::days(offset)))
            .map(|day| self.entry(day))
            .collect()
    }

    /// Recorded values of `metric` between `from` and `to` inclusive
    pub fn series(&self, metric: JournalMetric, from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, f64)> {
        if from > to {
            return Vec::new();
        }
        self.logs
            .range(from..=to)
            .filter_map(|(date, log)| metric.value(log).map(|v| (*date, v)))
            .collect()
    }

    /// Load-modify-save for one date
    fn upsert<F>(&mut self, date: NaiveDate, f: F) -> Result<DailyLog>
    where
        F: FnOnce(&mut DailyLog) -> Result<()>,
    {
        let mut entry = self.entry(date);
        f(&mut entry)?;

        let mut logs = self.logs.clone();
        logs.insert(date, entry.clone());
        records::save_journal(&mut self.store, &logs)?;
        self.logs = logs;

        tracing::debug!("Updated journal entry for {}", date);
        Ok(entry)
    }
}

/// Litres of water for a number of cups of `unit_liters` each
pub fn water_liters(units: u32, unit_liters: f64) -> f64 {
    f64::from(units) * unit_liters
}

fn merge(slot: &mut Option<f64>, update: Option<f64>) {
    if update.is_some() {
        *slot = update;
    }
}

fn check_positive(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !is_positive(v) => Err(Error::Validation(format!(
            "{} must be a positive number, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

fn check_non_negative(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !is_non_negative(v) => Err(Error::Validation(format!(
            "{} must not be negative, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn journal() -> Journal<MemoryStore> {
        Journal::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_missing_entry_is_empty() {
        let journal = journal();
        let entry = journal.entry(day(3));
        assert_eq!(entry, DailyLog::empty(day(3)));
        assert!(journal.logs().is_empty());
    }

    #[test]
    fn test_water_add_and_remove() {
        let mut journal = journal();
        journal.add_water(day(3)).unwrap();
        journal.add_water(day(3)).unwrap();
        assert_eq!(journal.entry(day(3)).water_units(), 2);

        journal.remove_water(day(3)).unwrap();
        journal.remove_water(day(3)).unwrap();
        let entry = journal.remove_water(day(3)).unwrap();
        assert_eq!(entry.water_units(), 0);
    }

    #[test]
    fn test_remove_water_on_empty_day_does_not_create_entry() {
        let mut journal = journal();
        journal.remove_water(day(9)).unwrap();
        assert!(journal.logs().is_empty());
    }

    #[test]
    fn test_weight_validation() {
        let mut journal = journal();
        assert!(journal.record_weight(day(1), 0.0).is_err());
        assert!(journal.record_weight(day(1), f64::NAN).is_err());
        journal.record_weight(day(1), 72.4).unwrap();
        assert_eq!(journal.entry(day(1)).weight, Some(72.4));
    }

    #[test]
    fn test_measurements_merge() {
        let mut journal = journal();
        journal
            .record_measurements(
                day(2),
                BodyMeasurements {
                    chest: Some(98.0),
                    waist: Some(84.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let entry = journal
            .record_measurements(
                day(2),
                BodyMeasurements {
                    waist: Some(83.0),
                    hips: Some(101.0),
                    ..Default::default()
                },
            )
            .unwrap();

        let m = entry.measurements.unwrap();
        assert_eq!(m.chest, Some(98.0));
        assert_eq!(m.waist, Some(83.0));
        assert_eq!(m.hips, Some(101.0));
        assert_eq!(m.thigh, None);
    }

    #[test]
    fn test_blood_and_electrolytes() {
        let mut journal = journal();
        assert!(journal
            .record_blood_levels(
                day(5),
                BloodLevels {
                    ketones: Some(-0.1),
                    glucose: None
                }
            )
            .is_err());

        journal
            .record_blood_levels(
                day(5),
                BloodLevels {
                    ketones: Some(1.2),
                    glucose: Some(82.0),
                },
            )
            .unwrap();
        journal
            .record_electrolytes(
                day(5),
                Electrolytes {
                    sodium: Some(2000.0),
                    ..Default::default()
                },
            )
            .unwrap();

        let entry = journal.entry(day(5));
        assert_eq!(entry.blood_levels.unwrap().ketones, Some(1.2));
        assert_eq!(entry.electrolytes.unwrap().sodium, Some(2000.0));
    }

    #[test]
    fn test_one_record_per_date() {
        let mut journal = journal();
        journal.record_weight(day(7), 70.0).unwrap();
        journal.record_weight(day(7), 69.5).unwrap();
        journal.add_water(day(7)).unwrap();
        assert_eq!(journal.logs().len(), 1);
        assert_eq!(journal.entry(day(7)).weight, Some(69.5));
    }

    #[test]
    fn test_week_around() {
        let mut journal = journal();
        journal.record_weight(day(10), 70.0).unwrap();
        let week = journal.week_around(day(10));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(7));
        assert_eq!(week[6].date, day(13));
        assert_eq!(week[3].weight, Some(70.0));
    }

    #[test]
    fn test_week_around_calendar_edges() {
        let journal = journal();

        let week = journal.week_around(NaiveDate::MAX);
        assert_eq!(week.len(), 4);
        assert_eq!(week[3].date, NaiveDate::MAX);

        let week = journal.week_around(NaiveDate::MIN);
        assert_eq!(week.len(), 4);
        assert_eq!(week[0].date, NaiveDate::MIN);
    }

    #[test]
    fn test_series() {
        let mut journal = journal();
        journal.record_weight(day(1), 71.0).unwrap();
        journal.add_water(day(2)).unwrap();
        journal.record_weight(day(3), 70.2).unwrap();
        journal.record_weight(day(20), 69.0).unwrap();

        let weights = journal.series(JournalMetric::Weight, day(1), day(10));
        assert_eq!(weights, vec![(day(1), 71.0), (day(3), 70.2)]);
        assert!(journal.series(JournalMetric::Weight, day(10), day(1)).is_empty());
    }

    #[test]
    fn test_persists_and_reloads() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let mut journal = Journal::open(FileStore::new(temp_dir.path())).unwrap();
            journal.record_weight(day(4), 68.8).unwrap();
            journal.add_water(day(4)).unwrap();
        }
        let journal = Journal::open(FileStore::new(temp_dir.path())).unwrap();
        let entry = journal.entry(day(4));
        assert_eq!(entry.weight, Some(68.8));
        assert_eq!(entry.water_units(), 1);

        let raw = std::fs::read_to_string(temp_dir.path().join("journalLogs.json")).unwrap();
        assert!(raw.contains("\"2024-04-04\""));
        assert!(raw.contains("\"waterIntakeUnits\":1"));
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let mut store = MemoryStore::new();
        store.fail_writes_to(RecordKey::JournalLogs);
        let mut journal = Journal::open(store).unwrap();
        assert!(journal.record_weight(day(1), 70.0).is_err());
        assert!(journal.logs().is_empty());
    }

    #[test]
    fn test_corrupt_journal_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(RecordKey::JournalLogs, "[1,2,3]").unwrap();
        let journal = Journal::open(store).unwrap();
        assert!(journal.logs().is_empty());
    }

    #[test]
    fn test_out_of_range_stored_values_not_charted() {
        let mut store = MemoryStore::new();
        store
            .set(
                RecordKey::JournalLogs,
                r#"{"2024-04-01":{"date":"2024-04-01","weight":-70},"2024-04-02":{"date":"2024-04-02","weight":70.4}}"#,
            )
            .unwrap();
        let journal = Journal::open(store).unwrap();

        let points = journal.series(JournalMetric::Weight, day(1), day(30));
        assert_eq!(points, vec![(day(2), 70.4)]);
        assert_eq!(journal.entry(day(1)).weight, None);
    }

    #[test]
    fn test_water_liters() {
        assert_eq!(water_liters(6, 0.25), 1.5);
    }
}
