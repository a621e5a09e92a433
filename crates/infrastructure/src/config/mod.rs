//! Application configuration
//!
//! Split into focused sub-modules:
//! - `pipeline`: fetch client cache and concurrency, retry, scheduler timing
//! - `alerts`: alert thresholds and condition scoring
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `WEATHERWATCH_*` environment variables with `__` between
//! nested keys (e.g. `WEATHERWATCH_ALERTS__TEMPERATURE_THRESHOLD=38`).

mod alerts;
mod pipeline;

use std::path::{Path, PathBuf};

use application::AlertSettings;
use domain::{CityName, DomainError};
use integration_weather::{DEFAULT_RETRY_AFTER_SECS, OpenWeatherConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use alerts::{AlertsAppConfig, ScoringAppConfig};
pub use pipeline::{FetchAppConfig, RetryAppConfig, SchedulerAppConfig, fetch_client_config};

use crate::{adapters::FetchClientConfig, telemetry::TelemetryConfig};

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "WEATHERWATCH";

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<DomainError> for ConfigError {
    fn from(err: DomainError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenWeatherMap client settings
    #[serde(default)]
    pub weather: OpenWeatherConfig,

    #[serde(default)]
    pub fetch: FetchAppConfig,

    #[serde(default)]
    pub retry: RetryAppConfig,

    #[serde(default)]
    pub scheduler: SchedulerAppConfig,

    #[serde(default)]
    pub alerts: AlertsAppConfig,

    #[serde(default)]
    pub scoring: ScoringAppConfig,

    /// Cities to poll
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_cities() -> Vec<String> {
    ["Delhi", "Mumbai", "Chennai", "Bangalore", "Kolkata", "Hyderabad"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather: OpenWeatherConfig::default(),
            fetch: FetchAppConfig::default(),
            retry: RetryAppConfig::default(),
            scheduler: SchedulerAppConfig::default(),
            alerts: AlertsAppConfig::default(),
            scoring: ScoringAppConfig::default(),
            cities: default_cities(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Where configuration is read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSource {
    /// Explicit file; must exist when set
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    pub fn new(path: Option<impl AsRef<Path>>) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
        }
    }

    /// Load and validate the configuration
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_env(None)
    }

    fn load_with_env(
        &self,
        env: Option<config::Map<String, String>>,
    ) -> Result<AppConfig, ConfigError> {
        let file = match &self.path {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cities")
            .source(env);

        let config: AppConfig = config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(cities = config.cities.len(), "Configuration loaded");
        Ok(config)
    }
}

impl AppConfig {
    /// Load from `config.toml` in the working directory (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigSource::default().load()
    }

    /// Check values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.poll_interval_secs must be positive".to_string(),
            ));
        }
        let required = self.min_fetch_timeout_secs();
        if self.scheduler.fetch_timeout_secs <= required {
            return Err(ConfigError::Invalid(format!(
                "scheduler.fetch_timeout_secs must exceed {required}s so a \
                 {DEFAULT_RETRY_AFTER_SECS}s Retry-After wait fits after the retry budget"
            )));
        }
        if self.fetch.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_concurrent_requests must be positive".to_string(),
            ));
        }
        if self.fetch.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "fetch.cache_capacity must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.retry.multiplier.is_finite() && self.retry.multiplier >= 1.0) {
            return Err(ConfigError::Invalid(
                "retry.multiplier must be at least 1.0".to_string(),
            ));
        }
        self.alert_settings().validate()?;
        self.active_cities()?;
        Ok(())
    }

    /// Longest a single fetch can legitimately take with the default
    /// `Retry-After`
    ///
    /// The retry budget is checked before each backoff sleep, so the last
    /// attempt may still run a full request timeout past it. A rate limit
    /// then adds the provider's wait and one more request.
    pub const fn min_fetch_timeout_secs(&self) -> u64 {
        self.retry
            .max_elapsed_secs
            .saturating_add(DEFAULT_RETRY_AFTER_SECS)
            .saturating_add(self.weather.timeout_secs.saturating_mul(2))
    }

    /// Fail unless an API key is configured
    pub fn require_api_key(&self) -> Result<(), ConfigError> {
        if self.weather.has_api_key() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "weather.api_key is not set (use {ENV_PREFIX}_WEATHER__API_KEY)"
            )))
        }
    }

    /// Configured cities, validated and with duplicates removed
    pub fn active_cities(&self) -> Result<Vec<CityName>, DomainError> {
        let mut cities: Vec<CityName> = Vec::with_capacity(self.cities.len());
        for name in &self.cities {
            let city = CityName::new(name)?;
            if !cities.contains(&city) {
                cities.push(city);
            }
        }
        Ok(cities)
    }

    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings::from(&self.alerts)
    }

    pub fn fetch_client_config(&self) -> FetchClientConfig {
        fetch_client_config(&self.fetch, &self.retry)
    }
}
