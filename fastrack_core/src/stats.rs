//! Dashboard statistics over the completed-fast history.
//!
//! Fasts are attributed to the calendar day on which they ended, in the
//! caller's chosen time zone.

use crate::types::SECONDS_PER_HOUR;
use crate::CompletedFast;
use chrono::{Duration, NaiveDate, TimeZone};
use std::collections::HashSet;

const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Bar height is measured against a full day of fasting
const CHART_CEILING_HOURS: f64 = 24.0;

/// Aggregate figures for the dashboard
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_fasts: usize,
    pub longest_fast_seconds: u64,
    pub total_seconds: u64,
    pub days_with_fasts: usize,
}

impl HistoryStats {
    pub fn from_history<Tz: TimeZone>(history: &[CompletedFast], tz: &Tz) -> Self {
        let longest_fast_seconds = history
            .iter()
            .map(|f| f.duration_seconds)
            .max()
            .unwrap_or(0);
        let total_seconds = history.iter().map(|f| f.duration_seconds).sum();
        let days: HashSet<NaiveDate> = history.iter().map(|f| end_date(f, tz)).collect();

        Self {
            total_fasts: history.len(),
            longest_fast_seconds,
            total_seconds,
            days_with_fasts: days.len(),
        }
    }

    /// Longest fast in whole hours
    pub fn longest_fast_hours(&self) -> u64 {
        self.longest_fast_seconds / SECONDS_PER_HOUR
    }

    /// Total fasted time as whole days plus leftover whole hours
    pub fn total_days_and_hours(&self) -> (u64, u64) {
        (
            self.total_seconds / SECONDS_PER_DAY,
            (self.total_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
        )
    }
}

/// One day in the weekly chart
#[derive(Clone, Debug, PartialEq)]
pub struct DayBar {
    pub date: NaiveDate,
    pub hours: f64,
    pub is_today: bool,
}

impl DayBar {
    /// Bar height in percent of a 24-hour day, capped at 100
    pub fn height_percent(&self) -> f64 {
        (self.hours / CHART_CEILING_HOURS * 100.0).min(100.0)
    }
}

/// Hours fasted on each of the seven days ending with `today`, oldest first
///
/// Days before the earliest representable date are left out.
pub fn last_seven_days<Tz: TimeZone>(
    history: &[CompletedFast],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DayBar> {
    (0..7)
        .rev()
        .filter_map(|days_ago| {
            let date = today.checked_sub_signed(Duration::days(days_ago))?;
            let seconds: u64 = history
                .iter()
                .filter(|f| end_date(f, tz) == date)
                .map(|f| f.duration_seconds)
                .sum();
            Some(DayBar {
                date,
                hours: seconds as f64 / SECONDS_PER_HOUR as f64,
                is_today: days_ago == 0,
            })
        })
        .collect()
}

fn end_date<Tz: TimeZone>(fast: &CompletedFast, tz: &Tz) -> NaiveDate {
    fast.end_time.with_timezone(tz).date_naive()
}
