//! OpenWeatherMap client
//!
//! HTTP client for the `/weather` current-conditions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{ApiErrorBody, ApiResponse, Observation};

/// Retry-After value assumed when a 429 carries none
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Weather client errors
#[derive(Debug, Error)]
pub enum WeatherApiError {
    /// The provider does not know the city
    #[error("City not found: {0}")]
    CityNotFound(String),

    /// Too many requests
    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// The provider answered with a 5xx status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// The provider rejected the request (4xx other than 404/429)
    #[error("Request rejected: HTTP {status}: {message}")]
    RequestRejected { status: u16, message: String },

    /// No response within the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Response body could not be understood
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Client could not be built from the configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// OpenWeatherMap configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    /// API key (`appid` query parameter)
    #[serde(default = "default_api_key", skip_serializing)]
    pub api_key: SecretString,

    /// API base URL (default: <https://api.openweathermap.org/data/2.5>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Country code appended to city queries, e.g. "IN" gives `q=Delhi,IN`
    #[serde(default = "default_country_code")]
    pub country_code: Option<String>,

    /// Unit system: "metric", "imperial" or "standard" (default: metric)
    #[serde(default = "default_units")]
    pub units: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_key() -> SecretString {
    SecretString::from(String::new())
}

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_country_code() -> Option<String> {
    Some("IN".to_string())
}

fn default_units() -> String {
    "metric".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_base_url(),
            country_code: default_country_code(),
            units: default_units(),
            timeout_secs: default_timeout(),
        }
    }
}

impl std::fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("country_code", &self.country_code)
            .field("units", &self.units)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenWeatherConfig {
    /// Create a configuration with an API key and defaults otherwise
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            ..Self::default()
        }
    }

    /// Whether an API key is set
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }

    /// Value of the `q` query parameter for a city
    pub fn city_query(&self, city: &str) -> String {
        match self.country_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => format!("{city},{code}"),
            _ => city.to_string(),
        }
    }
}

/// Current-weather client
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Fetch current conditions for a city by name
    async fn current(&self, city: &str) -> Result<Observation, WeatherApiError>;
}

/// OpenWeatherMap HTTP client implementation
#[derive(Debug)]
pub struct OpenWeatherMapClient {
    client: Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherMapClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: OpenWeatherConfig) -> Result<Self, WeatherApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherApiError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Configuration in use
    pub const fn config(&self) -> &OpenWeatherConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/weather", self.config.base_url.trim_end_matches('/'))
    }

    fn parse_observation(body: &str) -> Result<Observation, WeatherApiError> {
        let api: ApiResponse =
            serde_json::from_str(body).map_err(|e| WeatherApiError::ParseError(e.to_string()))?;

        let weather = api.weather.into_iter().next().ok_or_else(|| {
            WeatherApiError::ParseError("Response contains no weather entry".to_string())
        })?;

        let observed_at = DateTime::<Utc>::from_timestamp(api.dt, 0).ok_or_else(|| {
            WeatherApiError::ParseError(format!("Invalid observation timestamp: {}", api.dt))
        })?;

        Ok(Observation {
            resolved_name: api.name,
            condition: weather.main,
            description: weather.description,
            temperature: api.main.temp,
            feels_like: api.main.feels_like,
            humidity: api.main.humidity,
            wind_speed: api.wind.map_or(0.0, |w| w.speed),
            observed_at,
        })
    }

    /// Seconds from a Retry-After header value; HTTP dates are not supported
    fn parse_retry_after(value: Option<&str>) -> u64 {
        value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
    }

    fn error_message(body: &str) -> Option<(Option<u16>, String)> {
        let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
        let code = parsed.code();
        parsed.message.map(|m| (code, m))
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherMapClient {
    #[instrument(skip(self))]
    async fn current(&self, city: &str) -> Result<Observation, WeatherApiError> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching current weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", self.config.city_query(city).as_str()),
                ("appid", self.config.api_key.expose_secret()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherApiError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    WeatherApiError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = Self::parse_retry_after(
                response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(WeatherApiError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherApiError::CityNotFound(city.to_string()));
        }
        if status.is_server_error() {
            return Err(WeatherApiError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                WeatherApiError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                }
            } else {
                WeatherApiError::ParseError(e.to_string())
            }
        })?;

        if !status.is_success() {
            let message = Self::error_message(&body)
                .map_or_else(|| format!("HTTP {status}"), |(_, message)| message);
            return Err(WeatherApiError::RequestRejected {
                status: status.as_u16(),
                message,
            });
        }

        // The API has been seen to answer 200 with an error body.
        if let Some((Some(404), _)) = Self::error_message(&body) {
            return Err(WeatherApiError::CityNotFound(city.to_string()));
        }

        Self::parse_observation(&body)
    }
}
