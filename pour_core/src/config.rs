//! Configuration file support for Pour.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pour/config.toml`.

use crate::types::DrinkDefinition;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub thresholds: RuleThresholds,

    #[serde(default)]
    pub drinks: DrinksConfig,
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

/// Rule thresholds for the health-rule engine.
///
/// The drink-id sets the rules apply to are fixed in `rules`; only the
/// time windows and the hydration cap are tunable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleThresholds {
    #[serde(default = "default_wine_cooldown_minutes")]
    pub wine_cooldown_minutes: i64,

    #[serde(default = "default_interaction_window_hours")]
    pub interaction_window_hours: i64,

    #[serde(default = "default_hydration_window_minutes")]
    pub hydration_window_minutes: i64,

    #[serde(default = "default_hydration_cap_portions")]
    pub hydration_cap_portions: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            wine_cooldown_minutes: default_wine_cooldown_minutes(),
            interaction_window_hours: default_interaction_window_hours(),
            hydration_window_minutes: default_hydration_window_minutes(),
            hydration_cap_portions: default_hydration_cap_portions(),
        }
    }
}

/// Custom drink definition supplied by the user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomDrink {
    pub id: String,
    pub icon: String,
    pub name: String,
    pub portions: Vec<f64>,
}

impl From<CustomDrink> for DrinkDefinition {
    fn from(drink: CustomDrink) -> Self {
        DrinkDefinition {
            id: drink.id,
            icon: drink.icon,
            name: drink.name,
            portions: drink.portions,
            custom: true,
        }
    }
}

/// User-defined drinks configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DrinksConfig {
    #[serde(default)]
    pub custom: Vec<CustomDrink>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("pour")
}

fn default_wine_cooldown_minutes() -> i64 {
    30
}

fn default_interaction_window_hours() -> i64 {
    4
}

fn default_hydration_window_minutes() -> i64 {
    60
}

fn default_hydration_cap_portions() -> f64 {
    1.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("pour").join("config.toml")
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

    /// The custom drinks as catalog-ready definitions
    pub fn custom_drinks(&self) -> Vec<DrinkDefinition> {
        self.drinks.custom.iter().cloned().map(Into::into).collect()
    }
}
