//! Reading entity - one upstream weather observation for a city

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertType, CityName, WeatherCondition};

/// A single weather observation
///
/// Created once from a successful upstream response and never mutated
/// afterwards. `observed_at` is the provider's timestamp, not the time the
/// reading was ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub city: CityName,
    pub condition: WeatherCondition,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Value of the metric an alert rule monitors
    pub const fn metric(&self, alert_type: AlertType) -> f64 {
        match alert_type {
            AlertType::Temperature => self.temperature_c,
            AlertType::Wind => self.wind_speed,
            AlertType::Humidity => self.humidity_pct,
        }
    }
}
