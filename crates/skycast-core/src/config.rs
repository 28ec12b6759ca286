use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Placeholder credential that selects demo data.
pub const DEMO_API_KEY: &str = "demo";

/// Upstream limits for the forecast `days` parameter.
pub const MIN_FORECAST_DAYS: u8 = 1;
pub const MAX_FORECAST_DAYS: u8 = 14;

/// Environment variable prefix; nesting uses `__` (e.g. `SKYCAST__WEATHER__API_KEY`).
const ENV_PREFIX: &str = "SKYCAST";

/// Returns true if `key` looks like a real credential rather than a placeholder.
pub fn is_real_credential(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != DEMO_API_KEY && !key.starts_with("YOUR_")
}

/// A single problem found in a setting, named by its dotted path
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Problems found by [`Config::validate`]; only errors make a config unusable
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors on one line, `; `-separated
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Errors become a single `ConfigError::Invalid`; warnings are logged.
    pub fn ensure_valid(&self) -> std::result::Result<(), ConfigError> {
        if !self.is_valid() {
            return Err(ConfigError::Invalid(self.error_summary()));
        }
        for warning in &self.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        Ok(())
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,

    /// Directory holding the persisted dashboard and preference blobs
    pub storage_dir: PathBuf,

    pub weather: WeatherConfig,

    pub maps: MapsConfig,

    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Default credential; a persisted key set by the user takes precedence
    pub api_key: String,

    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Retries after the first attempt for transient failures
    pub retry_attempts: u32,

    /// Initial backoff delay in milliseconds (doubles per attempt)
    pub retry_delay_ms: u64,

    /// How long a cached snapshot stays valid
    pub cache_minutes: u32,

    /// Auto-refresh interval; 0 disables it
    pub refresh_minutes: u32,

    pub forecast_days: u8,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: DEMO_API_KEY.to_string(),
            base_url: "https://api.weatherapi.com/v1".to_string(),
            timeout_ms: 10_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            cache_minutes: 10,
            refresh_minutes: 5,
            forecast_days: 7,
        }
    }
}

impl WeatherConfig {
    /// Check if a real credential is configured (not a placeholder)
    pub fn is_configured(&self) -> bool {
        is_real_credential(&self.api_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub tile_url: String,

    /// Separate tile credential; falls back to the weather key when unset
    pub api_key: Option<String>,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://maps.weatherapi.com/v1/statics".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub analytics: bool,
    pub error_reporting: bool,
    pub beta_features: bool,
    pub offline_mode: bool,
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            storage_dir: default_storage_dir(),
            weather: WeatherConfig::default(),
            maps: MapsConfig::default(),
            features: FeatureFlags::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default file layered with environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path` (may be missing) layered with environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse config file")?;

        tracing::debug!(
            "Loaded config (environment: {:?}, demo mode: {})",
            config.environment,
            !config.weather.is_configured()
        );
        Ok(config)
    }

    /// Load configuration and reject it if validation finds errors
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();
        validation.ensure_valid()?;
        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.weather.is_configured() {
            if self.environment == Environment::Production {
                result.add_error(
                    "weather.api_key",
                    "A real API key is required in production",
                );
            } else {
                result.add_warning(
                    "weather.api_key",
                    "No API key configured - demo data will be shown",
                );
            }
        }

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.maps.tile_url, "maps.tile_url", &mut result);

        if self.weather.timeout_ms == 0 {
            result.add_error("weather.timeout_ms", "Timeout must be greater than 0");
        }

        if self.weather.cache_minutes == 0 {
            result.add_error(
                "weather.cache_minutes",
                "Cache duration must be greater than 0",
            );
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Auto-refresh disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Refresh interval is more than 24 hours",
            );
        }

        if !(MIN_FORECAST_DAYS..=MAX_FORECAST_DAYS).contains(&self.weather.forecast_days) {
            result.add_error(
                "weather.forecast_days",
                format!(
                    "Forecast days must be between {} and {}",
                    MIN_FORECAST_DAYS, MAX_FORECAST_DAYS
                ),
            );
        }

        result
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config dir>/skycast/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_demo_key_is_warning_outside_production() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.warnings.iter().any(|w| w.field == "weather.api_key"));
    }

    #[test]
    fn test_production_requires_real_key() {
        let mut config = Config::default();
        config.environment = Environment::Production;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_key"));

        config.weather.api_key = "abc123".to_string();
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.maps.tile_url = "ftp://maps.example.com".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_forecast_days_out_of_range() {
        let mut config = Config::default();
        config.weather.forecast_days = 15;
        assert!(!config.validate().is_valid());
        config.weather.forecast_days = 0;
        let err = config.validate().ensure_valid().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("weather.forecast_days")));
    }

    #[test]
    fn test_zero_refresh_is_warning() {
        let mut config = Config::default();
        config.weather.refresh_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.refresh_minutes"));
    }

    #[test]
    fn test_is_real_credential() {
        assert!(!is_real_credential(""));
        assert!(!is_real_credential("   "));
        assert!(!is_real_credential("demo"));
        assert!(!is_real_credential("YOUR_WEATHER_API_KEY"));
        assert!(is_real_credential("0123456789abcdef"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.weather.cache_minutes = 3;
        config.weather.forecast_days = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.cache_minutes, 3);
        assert_eq!(loaded.weather.forecast_days, 3);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.weather.refresh_minutes, 5);
        assert_eq!(loaded.weather.cache_minutes, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\nrefresh_minutes = 1\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.refresh_minutes, 1);
        assert_eq!(loaded.weather.base_url, "https://api.weatherapi.com/v1");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\ntimeout_ms = 4000\n").unwrap();

        // Env is process-wide; these fields are never loaded by other tests here
        std::env::set_var("SKYCAST__WEATHER__TIMEOUT_MS", "2500");
        std::env::set_var("SKYCAST__WEATHER__API_KEY", "abc123");
        let loaded = Config::load_from(&path);
        std::env::remove_var("SKYCAST__WEATHER__TIMEOUT_MS");
        std::env::remove_var("SKYCAST__WEATHER__API_KEY");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.weather.timeout_ms, 2500);
        assert_eq!(loaded.weather.api_key, "abc123");
        assert!(loaded.weather.is_configured());
    }
}
