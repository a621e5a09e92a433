//! OpenWeatherMap response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one city, as reported upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// City name the provider resolved the query to
    pub resolved_name: Option<String>,
    /// Weather group, e.g. "Rain" or "Clear"
    pub condition: String,
    /// Free-text description, e.g. "light rain"
    pub description: Option<String>,
    /// Temperature in the requested units
    pub temperature: f64,
    /// Apparent temperature in the requested units
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed (m/s for metric units)
    pub wind_speed: f64,
    /// Observation time reported by the provider
    pub observed_at: DateTime<Utc>,
}

/// Raw `/weather` response body
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub weather: Vec<ApiWeather>,
    pub main: ApiMain,
    #[serde(default)]
    pub wind: Option<ApiWind>,
    /// Unix time of the observation
    pub dt: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWeather {
    pub main: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWind {
    #[serde(default)]
    pub speed: f64,
}

/// Error body, e.g. `{"cod":"404","message":"city not found"}`
///
/// `cod` is a string on errors and a number on success, so both are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub cod: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn code(&self) -> Option<u16> {
        match self.cod.as_ref()? {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            _ => None,
        }
    }
}
