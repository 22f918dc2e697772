//! Core domain types for the Fastrack system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Fasting plans, active sessions and completed fasts
//! - Metabolic phases (reference data)
//! - Daily journal entries and their metric groups
//! - User and meal suggestion records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Seconds in one hour, used for all hour/second conversions
pub const SECONDS_PER_HOUR: u64 = 3600;

// ============================================================================
// Fasting Types
// ============================================================================

/// A named target duration for a fast (e.g. "16:8")
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastingPlan {
    pub name: String,
    #[serde(alias = "hours")]
    pub target_hours: f64,
    #[serde(default)]
    pub description: String,
}

impl PartialEq for FastingPlan {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl FastingPlan {
    pub fn new(name: impl Into<String>, target_hours: f64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_hours,
            description: description.into(),
        }
    }

    /// Reject plans whose target is zero, negative or not a number
    pub fn validate(&self) -> Result<()> {
        if !self.target_hours.is_finite() || self.target_hours <= 0.0 {
            return Err(Error::Validation(format!(
                "plan '{}' must have a positive target, got {} hours",
                self.name, self.target_hours
            )));
        }
        Ok(())
    }

    /// Target duration in whole seconds
    pub fn target_seconds(&self) -> u64 {
        (self.target_hours * SECONDS_PER_HOUR as f64).round() as u64
    }
}

/// The single fast currently in progress
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFast {
    pub start_time: DateTime<Utc>,
    pub plan: FastingPlan,
}

impl ActiveFast {
    /// Whole seconds since `start_time`, clamped to zero when `now` is earlier
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        let seconds = (now - self.start_time).num_seconds();
        if seconds < 0 {
            tracing::debug!(
                "Clock skew: now {} is before fast start {}, clamping elapsed to 0",
                now,
                self.start_time
            );
            return 0;
        }
        seconds as u64
    }

    /// When the plan's target will be reached
    pub fn expected_end(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::seconds(self.plan.target_seconds() as i64)
    }
}

/// A finished fast, stored newest-first in the history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedFast {
    #[serde(flatten)]
    pub session: ActiveFast,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: u64,
}

impl CompletedFast {
    /// Close `session` at `now`
    ///
    /// A `now` earlier than the start is treated as the start itself, so the
    /// record always satisfies `end_time >= start_time`.
    pub fn from_session(session: ActiveFast, now: DateTime<Utc>) -> Self {
        let end_time = now.max(session.start_time);
        let duration_seconds = session.elapsed_seconds(end_time);
        Self {
            session,
            end_time,
            duration_seconds,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.session.start_time
    }

    pub fn plan(&self) -> &FastingPlan {
        &self.session.plan
    }

    /// Share of the plan's target actually fasted; may exceed 100
    pub fn achieved_percent(&self) -> f64 {
        let target = self.session.plan.target_seconds();
        if target == 0 {
            return 0.0;
        }
        self.duration_seconds as f64 / target as f64 * 100.0
    }

    /// Recompute `duration_seconds` from the timestamps
    ///
    /// Returns the previously stored duration when it disagreed. Records
    /// ending before they start are left alone for `validate` to reject.
    pub fn reconcile_duration(&mut self) -> Option<u64> {
        if self.end_time < self.session.start_time {
            return None;
        }
        let expected = self.session.elapsed_seconds(self.end_time);
        if expected == self.duration_seconds {
            return None;
        }
        Some(std::mem::replace(&mut self.duration_seconds, expected))
    }

    /// Check the duration/end-time invariants of a stored record
    pub fn validate(&self) -> Result<()> {
        self.session.plan.validate()?;
        if self.end_time < self.session.start_time {
            return Err(Error::Validation(format!(
                "fast ends ({}) before it starts ({})",
                self.end_time, self.session.start_time
            )));
        }
        let expected = self.session.elapsed_seconds(self.end_time);
        if self.duration_seconds != expected {
            return Err(Error::Validation(format!(
                "duration {}s does not match start/end span of {}s",
                self.duration_seconds, expected
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Metabolic Phases
// ============================================================================

/// A physiological stage reached after `threshold_hours` of fasting
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicPhase {
    pub threshold_hours: f64,
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
}

// ============================================================================
// Journal Types
// ============================================================================

/// Body measurements in centimetres
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyMeasurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thigh: Option<f64>,
}

/// Blood ketone and glucose readings (mmol/L and mg/dL)
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BloodLevels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ketones: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<f64>,
}

/// Electrolyte intake in milligrams
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Electrolytes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnesium: Option<f64>,
}

/// One calendar day of health-journal data
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(default, alias = "waterIntake", skip_serializing_if = "Option::is_none")]
    pub water_intake_units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<BodyMeasurements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_levels: Option<BloodLevels>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrolytes: Option<Electrolytes>,
}

impl DailyLog {
    /// An entry with no metrics recorded
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            water_intake_units: None,
            weight: None,
            measurements: None,
            blood_levels: None,
            electrolytes: None,
        }
    }

    pub fn water_units(&self) -> u32 {
        self.water_intake_units.unwrap_or(0)
    }

    /// Clear metric values outside their valid range, returning their names
    ///
    /// Weight and body measurements must be positive; blood levels and
    /// electrolytes must not be negative. Emptied groups are removed.
    pub fn drop_out_of_range(&mut self) -> Vec<&'static str> {
        let mut dropped = Vec::new();
        clear_unless(&mut dropped, "weight", &mut self.weight, is_positive);

        if let Some(m) = &mut self.measurements {
            clear_unless(&mut dropped, "chest", &mut m.chest, is_positive);
            clear_unless(&mut dropped, "waist", &mut m.waist, is_positive);
            clear_unless(&mut dropped, "hips", &mut m.hips, is_positive);
            clear_unless(&mut dropped, "thigh", &mut m.thigh, is_positive);
        }
        if let Some(b) = &mut self.blood_levels {
            clear_unless(&mut dropped, "ketones", &mut b.ketones, is_non_negative);
            clear_unless(&mut dropped, "glucose", &mut b.glucose, is_non_negative);
        }
        if let Some(e) = &mut self.electrolytes {
            clear_unless(&mut dropped, "sodium", &mut e.sodium, is_non_negative);
            clear_unless(&mut dropped, "potassium", &mut e.potassium, is_non_negative);
            clear_unless(&mut dropped, "magnesium", &mut e.magnesium, is_non_negative);
        }

        if self.measurements.as_ref() == Some(&BodyMeasurements::default()) {
            self.measurements = None;
        }
        if self.blood_levels.as_ref() == Some(&BloodLevels::default()) {
            self.blood_levels = None;
        }
        if self.electrolytes.as_ref() == Some(&Electrolytes::default()) {
            self.electrolytes = None;
        }
        dropped
    }
}

/// Valid weight or body measurement
pub(crate) fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Valid blood level or electrolyte reading
pub(crate) fn is_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn clear_unless(
    dropped: &mut Vec<&'static str>,
    name: &'static str,
    slot: &mut Option<f64>,
    valid: fn(f64) -> bool,
) {
    if matches!(*slot, Some(v) if !valid(v)) {
        *slot = None;
        dropped.push(name);
    }
}

// ============================================================================
// User and Reference Records
// ============================================================================

/// The signed-in user; held as session state only
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// A suggested meal for breaking a fast
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MealSuggestion {
    pub title: String,
    pub emoji: String,
    pub items: Vec<String>,
}
