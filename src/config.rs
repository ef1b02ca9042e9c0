//! Configuration management for FinTrip
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{FintripError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for FinTrip
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// FinTrip backend settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Weather/geocoding provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Client-side cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Client storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every backend path is appended to
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    crate::http::DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Provider API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the geocoding API (`/direct` is appended)
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the forecast API (`/forecast` is appended)
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Unit system: standard, metric or imperial
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_geocoding_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_forecast_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            units: default_units(),
        }
    }
}

/// Longest accepted cache TTL (one year)
pub const MAX_CACHE_TTL_HOURS: u64 = 8760;

/// Longest accepted cookie lifetime (ten years)
pub const MAX_COOKIE_MAX_AGE_DAYS: u64 = 3650;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of geocoding and forecast entries (hours)
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_ttl_hours() -> u64 {
    crate::cache::DEFAULT_TTL_HOURS as u64
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl CacheConfig {
    /// TTL as a duration; out-of-range values fall back to the default.
    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or_else(|| chrono::Duration::hours(crate::cache::DEFAULT_TTL_HOURS))
    }
}

/// Client storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for `storage.json` and `cookies.json`; platform data dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Lifetime of the mirrored session cookie (days)
    #[serde(default = "default_cookie_max_age_days")]
    pub cookie_max_age_days: u64,
}

fn default_cookie_max_age_days() -> u64 {
    crate::session::DEFAULT_COOKIE_MAX_AGE_DAYS as u64
}

impl StorageConfig {
    /// Cookie lifetime as a duration; out-of-range values fall back to the
    /// default.
    pub fn cookie_max_age(&self) -> chrono::Duration {
        i64::try_from(self.cookie_max_age_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .unwrap_or_else(|| chrono::Duration::days(crate::session::DEFAULT_COOKIE_MAX_AGE_DAYS))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            cookie_max_age_days: default_cookie_max_age_days(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FintripError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FintripError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("FINTRIP_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("FINTRIP_API_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(value) => self.api.timeout_seconds = value,
                Err(_) => tracing::warn!(
                    "Ignoring invalid FINTRIP_API_TIMEOUT_SECONDS value: {}",
                    timeout
                ),
            }
        }

        if let Ok(api_key) = std::env::var("FINTRIP_WEATHER_API_KEY") {
            self.weather.api_key = Some(api_key);
        }

        if let Ok(url) = std::env::var("FINTRIP_WEATHER_GEOCODING_URL") {
            self.weather.geocoding_url = url;
        }

        if let Ok(url) = std::env::var("FINTRIP_WEATHER_FORECAST_URL") {
            self.weather.forecast_url = url;
        }

        if let Ok(units) = std::env::var("FINTRIP_WEATHER_UNITS") {
            self.weather.units = units;
        }

        if let Ok(ttl) = std::env::var("FINTRIP_CACHE_TTL_HOURS") {
            match ttl.parse() {
                Ok(value) => self.cache.ttl_hours = value,
                Err(_) => tracing::warn!("Ignoring invalid FINTRIP_CACHE_TTL_HOURS value: {}", ttl),
            }
        }

        if let Ok(dir) = std::env::var("FINTRIP_STORAGE_DIR") {
            self.storage.dir = Some(PathBuf::from(dir));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }

        if let Some(dir) = &cli.storage_dir {
            self.storage.dir = Some(dir.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`FintripError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        validate_http_url("api.base_url", &self.api.base_url)?;
        validate_http_url("weather.geocoding_url", &self.weather.geocoding_url)?;
        validate_http_url("weather.forecast_url", &self.weather.forecast_url)?;

        if self.api.timeout_seconds == 0 {
            return Err(FintripError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.ttl_hours == 0 || self.cache.ttl_hours > MAX_CACHE_TTL_HOURS {
            return Err(FintripError::Config(format!(
                "cache.ttl_hours must be between 1 and {}",
                MAX_CACHE_TTL_HOURS
            ))
            .into());
        }

        if self.storage.cookie_max_age_days == 0
            || self.storage.cookie_max_age_days > MAX_COOKIE_MAX_AGE_DAYS
        {
            return Err(FintripError::Config(format!(
                "storage.cookie_max_age_days must be between 1 and {}",
                MAX_COOKIE_MAX_AGE_DAYS
            ))
            .into());
        }

        let valid_units = ["standard", "metric", "imperial"];
        if !valid_units.contains(&self.weather.units.as_str()) {
            return Err(FintripError::Config(format!(
                "Invalid weather.units: {}. Must be one of: {}",
                self.weather.units,
                valid_units.join(", ")
            ))
            .into());
        }

        Ok(())
    }

    /// Directory holding the client storage files.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage.dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::storage::default_storage_dir(),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| FintripError::Config(format!("{} is not a valid URL ({}): {}", field, value, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(FintripError::Config(format!(
            "{} must use http or https, got {}",
            field,
            parsed.scheme()
        ))
        .into());
    }

    Ok(())
}
