#![forbid(unsafe_code)]

//! Core domain model and business logic for the Fastrack fasting companion.
//!
//! This crate provides:
//! - Domain types (plans, active and completed fasts, journal entries)
//! - Reference data (plan catalog, metabolic timeline, quotes, menu)
//! - Fasting session engine and metabolic phase resolution
//! - Persistence (key-value records, journal)
//! - Dashboard statistics and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod records;
pub mod phase;
pub mod timer;
pub mod engine;
pub mod journal;
pub mod stats;
pub mod format;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{FileStore, KeyValueStore, MemoryStore, RecordKey};
pub use records::JournalLogs;
pub use phase::{MetabolicTimeline, MilestoneState, PhaseStatus};
pub use timer::Ticker;
pub use engine::{completion_percentage, FastProgress, FastState, FastingEngine};
pub use journal::{Journal, JournalMetric};
pub use stats::{last_seven_days, DayBar, HistoryStats};
