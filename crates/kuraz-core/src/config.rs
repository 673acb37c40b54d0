use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `suggestions.api_key`
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Activity suggestion settings
    #[serde(default)]
    pub suggestions: SuggestionsConfig,

    /// Backoff settings for the suggestion API
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Which weather provider backs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProviderKind {
    /// Fixed record after a fixed delay
    #[default]
    Simulated,
    /// Live lookup against Open-Meteo
    OpenMeteo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub provider: WeatherProviderKind,

    /// Used when the user leaves latitude blank
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    /// Used when the user leaves longitude blank
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,

    /// Artificial latency of the simulated provider
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,

    /// Open-Meteo base URL
    #[serde(default = "default_weather_api_url")]
    pub api_url: String,
}

// Addis Ababa
fn default_latitude() -> f64 {
    8.9806
}

fn default_longitude() -> f64 {
    38.7578
}

fn default_simulated_latency_ms() -> u64 {
    1500
}

fn default_weather_api_url() -> String {
    "https://api.open-meteo.com".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: WeatherProviderKind::default(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            simulated_latency_ms: default_simulated_latency_ms(),
            api_url: default_weather_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_suggestions_endpoint")]
    pub endpoint: String,

    /// Model name used in the generateContent path
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (optional, can be set via environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_suggestions_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-preview-05-20".to_string()
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_suggestions_endpoint(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl SuggestionsConfig {
    /// Resolve the API key, preferring the environment over the file.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    /// Resolve against an explicit environment value. Blank values on
    /// either side count as unset.
    fn api_key_with(&self, env_value: Option<String>) -> Result<String, ConfigError> {
        let non_blank = |key: &String| !key.trim().is_empty();
        env_value
            .filter(non_blank)
            .or_else(|| self.api_key.clone().filter(non_blank))
            .ok_or_else(|| ConfigError::MissingSetting("suggestions.api_key".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum rate-limited attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (doubles each attempt by default)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    /// Absolute deadline for one logical request, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file if
    /// it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Cannot read {}", config_path.display()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Cannot parse {}", config_path.display()))
    }

    /// Load (from `config_path`, or the user config dir) and validate.
    ///
    /// Errors fail the load; warnings are logged and handed back.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()))
                .context("Kuraz config is invalid");
        }

        for warning in &validation.warnings {
            tracing::warn!("config: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        check_url(&self.weather.api_url, "weather.api_url", &mut result);
        check_url(&self.suggestions.endpoint, "suggestions.endpoint", &mut result);

        if !(-90.0..=90.0).contains(&self.weather.default_latitude) {
            result.add_error(
                "weather.default_latitude",
                "Latitude must be between -90 and 90",
            );
        }

        if !(-180.0..=180.0).contains(&self.weather.default_longitude) {
            result.add_error(
                "weather.default_longitude",
                "Longitude must be between -180 and 180",
            );
        }

        if self.weather.simulated_latency_ms > 60_000 {
            result.add_warning(
                "weather.simulated_latency_ms",
                "Simulated latency is more than a minute",
            );
        }

        if self.suggestions.model.trim().is_empty() {
            result.add_error("suggestions.model", "Model name cannot be empty");
        }

        if self.suggestions.api_key().is_err() {
            result.add_warning(
                "suggestions.api_key",
                format!("No API key configured (set {}) - suggestions disabled", API_KEY_ENV),
            );
        }

        if self.retry.max_retries == 0 {
            result.add_error("retry.max_retries", "At least one attempt is required");
        } else if self.retry.max_retries > 10 {
            result.add_warning("retry.max_retries", "More than 10 attempts may wait for minutes");
        }

        if self.retry.backoff_multiplier == 0 {
            result.add_error("retry.backoff_multiplier", "Multiplier must be at least 1");
        }

        if self.retry.timeout_secs == 0 {
            result.add_warning("retry.timeout_secs", "Request timeout disabled (0 seconds)");
        }

        result
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Cannot serialize config")?;
        std::fs::write(config_path, contents)
            .with_context(|| format!("Cannot write {}", config_path.display()))
    }

    /// `<config_dir>/kuraz/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No user config directory on this platform")?;
        Ok(base.join("kuraz").join("config.toml"))
    }
}

/// Endpoints must be absolute http(s) URLs.
fn check_url(value: &str, field: &str, result: &mut ValidationResult) {
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(e) => {
            result.add_error(field, format!("Invalid URL: {}", e));
            return;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        result.add_error(field, format!("URL must use http or https scheme, got: {}", url.scheme()));
    }
    if url.host().is_none() {
        result.add_error(field, "URL must have a host");
    }
}
