//! Error types for the fastrack_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fastrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the engine's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A persisted record failed to parse or validate
    #[error("Corrupt persisted data in '{key}': {reason}")]
    CorruptData { key: String, reason: String },

    /// Rejected input value (plan, journal metric)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Plan name not present in the catalog
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// Metabolic timeline failed validation
    #[error("Timeline error: {0}")]
    Timeline(String),
}

impl Error {
    /// True for errors that startup recovery may discard and replace with defaults
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Error::CorruptData { .. })
    }
}
