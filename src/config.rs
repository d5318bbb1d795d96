//! Configuration system for hourspot.
//!
//! Handles the TOML-based configuration file, validation, and default value
//! generation. The configuration lives at
//! **XDG_CONFIG_HOME**/hourspot/hourspot.toml and is created with commented
//! defaults on first run.
//!
//! ```toml
//! # Where the extracted GeoNames dump files live
//! data_dir = "~/.local/share/hourspot"
//!
//! # Query defaults
//! target_hour = 17          # Local hour to match (0-23)
//! min_population = 2000     # Starting population floor
//! hard_floor = 500          # Relaxation never goes below this
//! floor_decay = 0.9         # Multiplicative relaxation factor
//! ```
//!
//! Invalid values produce errors that say what range is allowed.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::logger::Log;

/// Application configuration with query defaults and data paths.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the extracted GeoNames dump files.
    pub data_dir: Option<PathBuf>,
    /// Default local hour to match when the CLI gives none.
    pub target_hour: Option<u32>,
    /// Default starting population floor.
    pub min_population: Option<u64>,
    /// Floor relaxation never goes below this.
    pub hard_floor: Option<u64>,
    /// Multiplicative relaxation factor per retry.
    pub floor_decay: Option<f64>,
}

impl Config {
    /// Load the configuration, creating a default file if none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }
        Self::load_from_path(&config_path)
    }

    /// Load and validate a configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file location under the XDG config directory.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory (is $HOME set?)")?;
        Ok(config_dir.join("hourspot").join("hourspot.toml"))
    }

    /// Write a default configuration file with commented defaults.
    pub fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let data_dir = Self::default_data_dir()?;
        let content = format!(
            "# hourspot configuration\n\
             \n\
             # Where the extracted GeoNames dump files live:\n\
             #   {cities_url}\n\
             #   {admin1_url}\n\
             #   {countries_url}\n\
             data_dir = \"{data_dir}\"\n\
             \n\
             # Query defaults\n\
             target_hour = {hour}        # Local hour to match (0-{max_hour})\n\
             min_population = {floor}  # Starting population floor\n\
             hard_floor = {hard}       # Relaxation never goes below this\n\
             floor_decay = {decay}      # Multiplicative relaxation factor\n",
            cities_url = GEONAMES_CITIES_URL,
            admin1_url = GEONAMES_ADMIN1_URL,
            countries_url = GEONAMES_COUNTRIES_URL,
            data_dir = data_dir.display(),
            hour = DEFAULT_TARGET_HOUR,
            max_hour = MAXIMUM_TARGET_HOUR,
            floor = DEFAULT_MIN_POPULATION,
            hard = DEFAULT_HARD_FLOOR,
            decay = DEFAULT_FLOOR_DECAY,
        );

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file at {}", path.display()))?;
        Log::log_block_start(&format!("Created default config at {}", path.display()));
        Ok(())
    }

    fn default_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Could not determine data directory (is $HOME set?)")?;
        Ok(data_dir.join("hourspot"))
    }

    fn validate(&self) -> Result<()> {
        if let Some(hour) = self.target_hour {
            if hour > MAXIMUM_TARGET_HOUR {
                anyhow::bail!(
                    "target_hour must be between 0 and {}, got {}",
                    MAXIMUM_TARGET_HOUR,
                    hour
                );
            }
        }
        if let Some(decay) = self.floor_decay {
            if !(MINIMUM_FLOOR_DECAY..=MAXIMUM_FLOOR_DECAY).contains(&decay) {
                anyhow::bail!(
                    "floor_decay must be between {} and {}, got {}",
                    MINIMUM_FLOOR_DECAY,
                    MAXIMUM_FLOOR_DECAY,
                    decay
                );
            }
        }
        if let (Some(min_population), Some(hard_floor)) = (self.min_population, self.hard_floor) {
            if hard_floor > min_population {
                anyhow::bail!(
                    "hard_floor ({}) must not exceed min_population ({})",
                    hard_floor,
                    min_population
                );
            }
        }
        Ok(())
    }

    // ═══ Effective values with defaults applied ═══

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }

    pub fn target_hour(&self) -> u32 {
        self.target_hour.unwrap_or(DEFAULT_TARGET_HOUR)
    }

    pub fn min_population(&self) -> u64 {
        self.min_population.unwrap_or(DEFAULT_MIN_POPULATION)
    }

    pub fn hard_floor(&self) -> u64 {
        self.hard_floor.unwrap_or(DEFAULT_HARD_FLOOR)
    }

    pub fn floor_decay(&self) -> f64 {
        self.floor_decay.unwrap_or(DEFAULT_FLOOR_DECAY)
    }
}
