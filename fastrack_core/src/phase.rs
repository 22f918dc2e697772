//! Metabolic phase resolution.
//!
//! Maps elapsed fasting hours onto a sorted timeline of phase checkpoints.
//! Each phase covers the half-open interval `[threshold, next_threshold)`,
//! so a fast sitting exactly on a threshold belongs to that phase.

use crate::types::{MetabolicPhase, SECONDS_PER_HOUR};
use crate::{Error, Result};

/// A validated, strictly increasing sequence of metabolic phases
#[derive(Clone, Debug, PartialEq)]
pub struct MetabolicTimeline {
    phases: Vec<MetabolicPhase>,
}

/// Where a fast stands on the timeline
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseStatus<'a> {
    /// Current phase; `None` before the first threshold
    pub phase: Option<&'a MetabolicPhase>,
    /// Upcoming phase; `None` once the final phase is reached
    pub next_phase: Option<&'a MetabolicPhase>,
    /// Progress toward `next_phase`, in `[0, 100]`
    pub progress_percent: f64,
    /// Hours remaining until `next_phase` starts
    pub hours_until_next: Option<f64>,
}

/// Display state of one phase in the timeline guide
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilestoneState {
    Reached,
    Next,
    Upcoming,
}

impl MetabolicTimeline {
    /// Build a timeline, rejecting empty, unsorted or non-finite input
    pub fn new(phases: Vec<MetabolicPhase>) -> Result<Self> {
        if phases.is_empty() {
            return Err(Error::Timeline("timeline has no phases".into()));
        }
        for phase in &phases {
            if !phase.threshold_hours.is_finite() || phase.threshold_hours < 0.0 {
                return Err(Error::Timeline(format!(
                    "phase '{}' has invalid threshold {}",
                    phase.title, phase.threshold_hours
                )));
            }
        }
        if let Some(pair) = phases
            .windows(2)
            .find(|w| w[0].threshold_hours >= w[1].threshold_hours)
        {
            return Err(Error::Timeline(format!(
                "thresholds must be strictly increasing: '{}' at {}h is followed by '{}' at {}h",
                pair[0].title, pair[0].threshold_hours, pair[1].title, pair[1].threshold_hours
            )));
        }
        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[MetabolicPhase] {
        &self.phases
    }

    /// Resolve the phase for a number of elapsed seconds
    pub fn resolve_seconds(&self, elapsed_seconds: u64) -> PhaseStatus<'_> {
        self.resolve(elapsed_seconds as f64 / SECONDS_PER_HOUR as f64)
    }

    /// Resolve the current phase, next phase and progress for `elapsed_hours`
    ///
    /// Pure: identical input always yields identical output.
    pub fn resolve(&self, elapsed_hours: f64) -> PhaseStatus<'_> {
        let elapsed_hours = elapsed_hours.max(0.0);
        let first = &self.phases[0];

        // Number of phases whose threshold has been reached
        let reached = self
            .phases
            .partition_point(|p| p.threshold_hours <= elapsed_hours);

        if reached == 0 {
            let progress = if first.threshold_hours > 0.0 {
                elapsed_hours / first.threshold_hours * 100.0
            } else {
                100.0
            };
            return PhaseStatus {
                phase: None,
                next_phase: Some(first),
                progress_percent: clamp_percent(progress),
                hours_until_next: Some(first.threshold_hours - elapsed_hours),
            };
        }

        let current = &self.phases[reached - 1];
        match self.phases.get(reached) {
            Some(next) => {
                let span = next.threshold_hours - current.threshold_hours;
                let progress = (elapsed_hours - current.threshold_hours) / span * 100.0;
                PhaseStatus {
                    phase: Some(current),
                    next_phase: Some(next),
                    progress_percent: clamp_percent(progress),
                    hours_until_next: Some(next.threshold_hours - elapsed_hours),
                }
            }
            None => PhaseStatus {
                phase: Some(current),
                next_phase: None,
                progress_percent: 100.0,
                hours_until_next: None,
            },
        }
    }

    /// Mark every phase as reached, next, or upcoming
    ///
    /// With no fast running every phase is `Upcoming`.
    pub fn milestones(
        &self,
        elapsed_hours: f64,
        active: bool,
    ) -> Vec<(&MetabolicPhase, MilestoneState)> {
        let mut next_assigned = false;
        self.phases
            .iter()
            .map(|phase| {
                let state = if !active {
                    MilestoneState::Upcoming
                } else if elapsed_hours >= phase.threshold_hours {
                    MilestoneState::Reached
                } else if !next_assigned {
                    next_assigned = true;
                    MilestoneState::Next
                } else {
                    MilestoneState::Upcoming
                };
                (phase, state)
            })
            .collect()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
