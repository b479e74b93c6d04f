use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// config_url = "https://clima.example.org/api/config"
/// save_city_url = "https://clima.example.org/saveCity"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Same-origin endpoint that hands out the weather provider key (`{ "apiKey": ... }`).
    pub config_url: String,

    pub weather_base_url: String,
    pub units: String,
    pub lang: String,

    /// Bound for each individual request: the key fetch and both pipeline stages.
    pub request_timeout_ms: u64,

    pub min_search_interval_ms: u64,

    /// How many forecast entries to keep (3-hour steps). Values above 16 (48 hours) are
    /// capped at 16.
    pub forecast_limit: usize,

    /// Legacy persistence endpoint. Searches are not recorded when unset.
    pub save_city_url: Option<String>,

    /// Bound for one `saveCity` request. Recording runs after the result is returned.
    pub save_city_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_url: "http://localhost:8788/api/config".to_string(),
            weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            units: "metric".to_string(),
            lang: "es".to_string(),
            request_timeout_ms: 8000,
            min_search_interval_ms: 2000,
            forecast_limit: 16,
            save_city_url: None,
            save_city_timeout_ms: 2000,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn save_city_timeout(&self) -> Duration {
        Duration::from_millis(self.save_city_timeout_ms)
    }

    pub fn min_search_interval(&self) -> Duration {
        Duration::from_millis(self.min_search_interval_ms)
    }

    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "clima", "clima")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
