//! Configuration file support for Fastrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fastrack/config.toml`.

use crate::{catalog, Error, FastingPlan, Result, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub fasting: FastingConfig,

    #[serde(default)]
    pub journal: JournalConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Fasting timer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FastingConfig {
    /// Catalog plan selected when no fast is running
    #[serde(default = "default_plan_name")]
    pub default_plan: String,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for FastingConfig {
    fn default() -> Self {
        Self {
            default_plan: default_plan_name(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Journal configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Volume of one water unit (cup) in litres
    #[serde(default = "default_water_unit_liters")]
    pub water_unit_liters: f64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            water_unit_liters: default_water_unit_liters(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fastrack")
}

fn default_plan_name() -> String {
    "16:8".into()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_water_unit_liters() -> f64 {
    0.25
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fastrack").join("config.toml")
    }

    /// Check values that TOML typing alone cannot enforce
    pub fn validate(&self) -> Result<()> {
        catalog::plan_by_name(&self.fasting.default_plan).map_err(|_| {
            Error::Config(format!(
                "default_plan '{}' is not in the plan catalog",
                self.fasting.default_plan
            ))
        })?;
        if self.fasting.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be at least 1".into()));
        }
        let unit = self.journal.water_unit_liters;
        if !unit.is_finite() || unit <= 0.0 {
            return Err(Error::Config(format!(
                "water_unit_liters must be positive, got {}",
                unit
            )));
        }
        Ok(())
    }

    /// The configured default plan from the catalog
    pub fn default_plan(&self) -> Result<FastingPlan> {
        catalog::plan_by_name(&self.fasting.default_plan).cloned()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.fasting.tick_interval_ms)
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fasting.default_plan, "16:8");
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.journal.water_unit_liters, 0.25);
        assert!(config.user.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(config.default_plan().unwrap().target_hours, 16.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.fasting.default_plan = "OMAD".into();
        config.user = Some(User {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            photo: None,
        });
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.fasting.default_plan, "OMAD");
        assert_eq!(loaded.user, config.user);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[fasting]
tick_interval_ms = 250
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fasting.tick_interval_ms, 250);
        assert_eq!(config.fasting.default_plan, "16:8"); // default
        assert_eq!(config.journal.water_unit_liters, 0.25); // default
    }

    #[test]
    fn test_unknown_default_plan_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[fasting]\ndefault_plan = \"72:0\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut config = Config::default();
        config.fasting.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
