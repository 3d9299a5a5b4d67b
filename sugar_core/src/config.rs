//! Configuration file support for SugarMeter.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/sugarmeter/config.toml`.

use crate::unit::SugarUnit;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Older store whose keys are copied over when missing
    #[serde(default)]
    pub legacy_store: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            legacy_store: None,
        }
    }
}

/// Engine defaults used before the user changes anything
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_daily_limit")]
    pub default_daily_limit: i32,

    #[serde(default = "default_visual_capacity_multiplier")]
    pub visual_capacity_multiplier: f64,

    #[serde(default = "default_min_visual_capacity_grams")]
    pub min_visual_capacity_grams: i32,

    #[serde(default = "default_featured_capacity")]
    pub featured_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_daily_limit: default_daily_limit(),
            visual_capacity_multiplier: default_visual_capacity_multiplier(),
            min_visual_capacity_grams: default_min_visual_capacity_grams(),
            featured_capacity: default_featured_capacity(),
        }
    }
}

/// Presentation preferences
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub unit: SugarUnit,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(std::env::temp_dir)
    });
    base.join("sugarmeter")
}

fn default_daily_limit() -> i32 {
    36
}

fn default_visual_capacity_multiplier() -> f64 {
    5.0
}

fn default_min_visual_capacity_grams() -> i32 {
    180
}

fn default_featured_capacity() -> usize {
    crate::catalog::FEATURED_CAPACITY
}

impl TrackerConfig {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_daily_limit < 1 {
            return Err(Error::Config(format!(
                "default_daily_limit must be at least 1, got {}",
                self.default_daily_limit
            )));
        }
        if !self.visual_capacity_multiplier.is_finite() || self.visual_capacity_multiplier < 1.0 {
            return Err(Error::Config(format!(
                "visual_capacity_multiplier must be >= 1.0, got {}",
                self.visual_capacity_multiplier
            )));
        }
        if self.featured_capacity == 0 {
            return Err(Error::Config("featured_capacity must be at least 1".into()));
        }
        Ok(())
    }
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
        config.tracker.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(std::env::temp_dir)
        });
        base.join("sugarmeter").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
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
