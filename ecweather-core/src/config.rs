use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::{Language, Province};

/// Roughly a century; older daily records are not useful for a dashboard.
const MAX_DAILY_LAG_DAYS: i64 = 36_500;

/// Where the dashboard listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8501 }
    }
}

/// Endpoints and lookup parameters for the Environment Canada provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Datamart root serving the site list and city-page XML.
    pub datamart_url: String,
    /// OGC API root used to search climate stations.
    pub geomet_url: String,
    /// Climate archive root serving daily bulk CSV.
    pub climate_url: String,
    pub timeout_secs: u64,
    pub language: Language,
    pub search_radius_km: f64,
    pub search_limit: usize,
    /// A climate station qualifies when its daily record ends no earlier
    /// than this many days ago.
    pub max_daily_lag_days: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            datamart_url: "https://dd.weather.gc.ca".to_string(),
            geomet_url: "https://api.weather.gc.ca".to_string(),
            climate_url: "https://climate.weather.gc.ca".to_string(),
            timeout_secs: 30,
            language: Language::English,
            search_radius_km: 25.0,
            search_limit: 10,
            max_daily_lag_days: 1,
        }
    }
}

/// What the dashboard shows before the user picks anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub default_province: Province,
    /// Station selector, e.g. "PE/s0000583" or "Charlottetown".
    pub default_station: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { default_province: Province::Alberta, default_station: None }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// port = 8080
///
/// [dashboard]
/// default_province = "PE"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "ecweather", "ecweather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("provider.timeout_secs must be greater than zero"));
        }
        if self.provider.search_radius_km.is_nan() || self.provider.search_radius_km <= 0.0 {
            return Err(anyhow!("provider.search_radius_km must be positive"));
        }
        if self.provider.search_limit == 0 {
            return Err(anyhow!("provider.search_limit must be at least 1"));
        }
        if !(0..=MAX_DAILY_LAG_DAYS).contains(&self.provider.max_daily_lag_days) {
            return Err(anyhow!(
                "provider.max_daily_lag_days must be between 0 and {MAX_DAILY_LAG_DAYS}"
            ));
        }
        Ok(())
    }
}
