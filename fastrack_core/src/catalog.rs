//! Built-in reference data: fasting plans, the metabolic timeline,
//! motivational quotes and break-fast meal suggestions.
//!
//! All tables are immutable and built once on first use.

use crate::phase::MetabolicTimeline;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;

static PLAN_CATALOG: Lazy<Vec<FastingPlan>> = Lazy::new(build_plan_catalog);

static DEFAULT_TIMELINE: Lazy<MetabolicTimeline> = Lazy::new(|| {
    MetabolicTimeline::new(build_timeline_phases())
        .unwrap_or_else(|e| unreachable!("built-in timeline is sorted: {}", e))
});

static BREAK_FAST_MENU: Lazy<Vec<MealSuggestion>> = Lazy::new(build_break_fast_menu);

/// Motivational quotes shown when a fast is completed
pub const MOTIVATIONAL_QUOTES: &[&str] = &[
    "Discipline is choosing what you want most over what you want now.",
    "Every hour you fasted today was a choice you made for yourself.",
    "Small steps, repeated daily, change everything.",
    "Your body is stronger than your cravings.",
    "Consistency beats intensity. See you at the next fast.",
    "You did not just skip a meal, you kept a promise.",
];

/// The ordered plan catalog
pub fn plans() -> &'static [FastingPlan] {
    &PLAN_CATALOG
}

/// The built-in metabolic timeline
pub fn default_timeline() -> &'static MetabolicTimeline {
    &DEFAULT_TIMELINE
}

/// Suggested meals for breaking a fast
pub fn break_fast_menu() -> &'static [MealSuggestion] {
    &BREAK_FAST_MENU
}

/// Look up a plan by name (case-insensitive)
pub fn plan_by_name(name: &str) -> Result<&'static FastingPlan> {
    let wanted = name.trim();
    plans()
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| Error::UnknownPlan(wanted.to_string()))
}

/// The catalog plan with the same target as `plan`, if any
///
/// Used when restoring an active fast: a persisted plan is matched back to
/// the catalog entry by its target duration.
pub fn catalog_match(plan: &FastingPlan) -> Option<&'static FastingPlan> {
    plans()
        .iter()
        .find(|p| (p.target_hours - plan.target_hours).abs() < f64::EPSILON)
}

/// Deterministic quote for a completed fast
pub fn quote_for(fast: &CompletedFast) -> &'static str {
    let index = fast.start_time().timestamp().rem_euclid(MOTIVATIONAL_QUOTES.len() as i64);
    MOTIVATIONAL_QUOTES[index as usize]
}

fn build_plan_catalog() -> Vec<FastingPlan> {
    vec![
        FastingPlan::new(
            "16:8",
            16.0,
            "Fast for 16 hours, eat in an 8-hour window. Great for beginners.",
        ),
        FastingPlan::new(
            "18:6",
            18.0,
            "Fast for 18 hours, eat in a 6-hour window. A step up.",
        ),
        FastingPlan::new(
            "20:4",
            20.0,
            "Fast for 20 hours, eat in a 4-hour window. More advanced.",
        ),
        FastingPlan::new("OMAD", 23.0, "One Meal A Day. Fast for 23 hours."),
        FastingPlan::new(
            "36 Hours",
            36.0,
            "A full day of fasting. Consult a doctor before trying.",
        ),
    ]
}

fn phase(threshold_hours: f64, title: &str, description: &str, benefits: &[&str]) -> MetabolicPhase {
    MetabolicPhase {
        threshold_hours,
        title: title.into(),
        description: description.into(),
        benefits: benefits.iter().map(|b| (*b).to_string()).collect(),
    }
}

fn build_timeline_phases() -> Vec<MetabolicPhase> {
    vec![
        phase(
            12.0,
            "Fat Burning",
            "Glycogen stores are running low and the body starts drawing on fat for fuel.",
            &["Insulin levels drop", "Fat mobilisation begins"],
        ),
        phase(
            14.0,
            "Early Ketosis",
            "The liver converts fatty acids into ketone bodies as an alternative fuel.",
            &["Steadier energy", "Reduced hunger signals"],
        ),
        phase(
            16.0,
            "Autophagy",
            "Cells begin recycling damaged components.",
            &["Cellular cleanup", "Lower inflammation markers"],
        ),
        phase(
            18.0,
            "Deep Ketosis",
            "Ketone levels rise further and fat becomes the dominant fuel.",
            &["Mental clarity", "Increased fat oxidation"],
        ),
        phase(
            24.0,
            "Growth Hormone Peak",
            "Growth hormone rises sharply to preserve lean mass.",
            &["Muscle preservation", "Accelerated autophagy"],
        ),
    ]
}

fn meal(title: &str, emoji: &str, items: &[&str]) -> MealSuggestion {
    MealSuggestion {
        title: title.into(),
        emoji: emoji.into(),
        items: items.iter().map(|i| (*i).to_string()).collect(),
    }
}

fn build_break_fast_menu() -> Vec<MealSuggestion> {
    vec![
        meal(
            "Bone broth starter",
            "🍲",
            &["A cup of warm bone broth", "A pinch of sea salt"],
        ),
        meal(
            "Eggs and greens",
            "🍳",
            &["Two scrambled eggs", "Sautéed spinach", "Half an avocado"],
        ),
        meal(
            "Grilled protein plate",
            "🍗",
            &["Grilled chicken or fish", "Steamed vegetables", "Olive oil drizzle"],
        ),
        meal(
            "Greek yoghurt bowl",
            "🥣",
            &["Plain Greek yoghurt", "A handful of berries", "Chia seeds"],
        ),
    ]
}
