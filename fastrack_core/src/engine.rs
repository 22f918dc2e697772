//! Fasting session engine.
//!
//! Owns the single active fast and the completed-fast history:
//! - `Idle` → `Running` on `start_fast`
//! - `Running` → `Idle` on `end_fast`, which appends to history
//!
//! Every transition is persisted before the in-memory state changes.

use crate::records;
use crate::store::{KeyValueStore, RecordKey};
use crate::timer::Ticker;
use crate::{catalog, ActiveFast, CompletedFast, Error, FastingPlan, Result};
use chrono::{DateTime, Utc};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Engine lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FastState {
    Idle,
    Running,
}

/// Snapshot of a running fast at a point in time
#[derive(Clone, Debug, PartialEq)]
pub struct FastProgress {
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    pub target_seconds: u64,
    pub percent: f64,
    pub expected_end: DateTime<Utc>,
}

/// Share of `total_seconds` covered by `elapsed_seconds`, capped at 100
pub fn completion_percentage(elapsed_seconds: u64, total_seconds: u64) -> f64 {
    if total_seconds == 0 {
        return 0.0;
    }
    (elapsed_seconds as f64 / total_seconds as f64 * 100.0).min(100.0)
}

pub struct FastingEngine<S: KeyValueStore> {
    store: S,
    selected_plan: FastingPlan,
    active: Option<ActiveFast>,
    history: Vec<CompletedFast>,
    ticker: Option<Ticker>,
}

impl<S: KeyValueStore> FastingEngine<S> {
    /// Load persisted state and build the engine
    ///
    /// Corrupt records are discarded with a warning and replaced by empty
    /// defaults. Only storage I/O failures are returned as errors.
    pub fn open(mut store: S, default_plan: FastingPlan) -> Result<Self> {
        let history = match records::load_history_entries(&store) {
            Ok(loaded) => {
                if loaded.skipped > 0 {
                    store.preserve(RecordKey::FastingHistory)?;
                }
                loaded.fasts
            }
            Err(e) if e.is_corrupt_data() => {
                tracing::warn!("{}. Starting with an empty history.", e);
                store.discard(RecordKey::FastingHistory)?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut active = match records::load_active(&store) {
            Ok(active) => active,
            Err(e) if e.is_corrupt_data() => {
                tracing::warn!("{}. Starting idle.", e);
                store.discard(RecordKey::ActiveFast)?;
                None
            }
            Err(e) => return Err(e),
        };

        // A crash between the two end_fast writes leaves the fast both
        // recorded and active; the history entry wins.
        let stale = matches!(
            (&active, history.first()),
            (Some(a), Some(latest)) if latest.session == *a
        );
        if stale {
            tracing::warn!("Active fast is already recorded in history; clearing it");
            records::save_active(&mut store, None)?;
            active = None;
        }

        let selected_plan = match &active {
            Some(a) => catalog::catalog_match(&a.plan)
                .cloned()
                .unwrap_or_else(|| a.plan.clone()),
            None => default_plan,
        };

        let engine = Self {
            store,
            selected_plan,
            active,
            history,
            ticker: None,
        };

        tracing::info!(
            "Fasting engine ready: {:?}, {} completed fasts",
            engine.state(),
            engine.history.len()
        );
        Ok(engine)
    }

    pub fn state(&self) -> FastState {
        if self.active.is_some() {
            FastState::Running
        } else {
            FastState::Idle
        }
    }

    pub fn active(&self) -> Option<&ActiveFast> {
        self.active.as_ref()
    }

    /// Completed fasts, newest first
    pub fn history(&self) -> &[CompletedFast] {
        &self.history
    }

    pub fn selected_plan(&self) -> &FastingPlan {
        &self.selected_plan
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Choose the plan for the next fast
    ///
    /// A running fast keeps its own plan; the selection only affects the
    /// target once the engine is idle again.
    pub fn select_plan(&mut self, plan: FastingPlan) -> Result<()> {
        plan.validate()?;
        tracing::debug!("Selected plan {}", plan.name);
        self.selected_plan = plan;
        Ok(())
    }

    /// Start a fast at `now`
    ///
    /// Rejected with `InvalidState` while another fast is running; the
    /// running fast is left untouched.
    pub fn start_fast(&mut self, plan: FastingPlan, now: DateTime<Utc>) -> Result<&ActiveFast> {
        if let Some(running) = &self.active {
            return Err(Error::InvalidState(format!(
                "a '{}' fast started at {} is already running",
                running.plan.name, running.start_time
            )));
        }
        plan.validate()?;

        let session = ActiveFast {
            start_time: now,
            plan,
        };
        records::save_active(&mut self.store, Some(&session))?;

        tracing::info!(
            "Started '{}' fast ({}h) at {}",
            session.plan.name,
            session.plan.target_hours,
            session.start_time
        );
        self.selected_plan = session.plan.clone();
        let active: &ActiveFast = self.active.insert(session);
        Ok(active)
    }

    /// Whole seconds elapsed at `now`, clamped to zero on clock skew
    pub fn tick(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.require_running("tick")?.elapsed_seconds(now))
    }

    /// End the running fast at `now` and record it
    ///
    /// History is written first, then the active record is removed. If the
    /// removal fails the previous history is written back, so the fast is
    /// never both active and recorded.
    pub fn end_fast(&mut self, now: DateTime<Utc>) -> Result<CompletedFast> {
        let session = self.require_running("end a fast")?.clone();
        let completed = CompletedFast::from_session(session, now);

        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.push(completed.clone());
        history.extend(self.history.iter().cloned());

        records::save_history(&mut self.store, &history)?;

        if let Err(e) = records::save_active(&mut self.store, None) {
            tracing::error!("Failed to clear active fast: {}. Rolling back history.", e);
            if let Err(rollback) = records::save_history(&mut self.store, &self.history) {
                tracing::error!("History rollback failed: {}", rollback);
            }
            return Err(e);
        }

        self.stop_ticker();
        self.history = history;
        self.active = None;

        tracing::info!(
            "Completed '{}' fast after {}s",
            completed.plan().name,
            completed.duration_seconds
        );
        Ok(completed)
    }

    /// Target of the running fast, or of the selected plan when idle
    pub fn current_total_target(&self) -> u64 {
        match &self.active {
            Some(active) => active.plan.target_seconds(),
            None => self.selected_plan.target_seconds(),
        }
    }

    /// Seconds left until the target, zero once it is reached
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Result<u64> {
        let elapsed = self.tick(now)?;
        Ok(self.current_total_target().saturating_sub(elapsed))
    }

    pub fn expected_end(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(ActiveFast::expected_end)
    }

    /// Elapsed, remaining and completion figures at `now`
    pub fn progress(&self, now: DateTime<Utc>) -> Result<FastProgress> {
        let active = self.require_running("report progress")?;
        let elapsed_seconds = active.elapsed_seconds(now);
        let target_seconds = self.current_total_target();
        Ok(FastProgress {
            elapsed_seconds,
            remaining_seconds: target_seconds.saturating_sub(elapsed_seconds),
            target_seconds,
            percent: completion_percentage(elapsed_seconds, target_seconds),
            expected_end: active.expected_end(),
        })
    }

    /// Start the periodic ticker for the running fast
    ///
    /// Replaces any ticker already running. The ticker is cancelled when the
    /// fast ends, on `stop_ticker`, or when the engine is dropped.
    pub fn start_ticker(&mut self, period: Duration) -> Result<Receiver<DateTime<Utc>>> {
        self.require_running("start the ticker")?;
        self.stop_ticker();
        let (ticker, ticks) = Ticker::spawn(period);
        self.ticker = Some(ticker);
        Ok(ticks)
    }

    pub fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker.as_ref().map_or(false, Ticker::is_running)
    }

    fn require_running(&self, action: &str) -> Result<&ActiveFast> {
        self.active
            .as_ref()
            .ok_or_else(|| Error::InvalidState(format!("cannot {}: no fast is running", action)))
    }
}
