//! Weather condition category
//!
//! Mirrors the `weather[].main` groups reported by OpenWeatherMap. Groups the
//! provider may add later are kept verbatim in [`WeatherCondition::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Enumerated weather category of a reading
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WeatherCondition {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
    Clear,
    Clouds,
    /// A category not known to this build
    Other(String),
}

impl WeatherCondition {
    /// Parse a provider group name, case-insensitively
    pub fn from_main(main: &str) -> Self {
        let trimmed = main.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "thunderstorm" => Self::Thunderstorm,
            "drizzle" => Self::Drizzle,
            "rain" => Self::Rain,
            "snow" => Self::Snow,
            "mist" => Self::Mist,
            "smoke" => Self::Smoke,
            "haze" => Self::Haze,
            "dust" => Self::Dust,
            "fog" => Self::Fog,
            "sand" => Self::Sand,
            "ash" => Self::Ash,
            "squall" => Self::Squall,
            "tornado" => Self::Tornado,
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Canonical provider name
    pub fn name(&self) -> &str {
        match self {
            Self::Thunderstorm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Mist => "Mist",
            Self::Smoke => "Smoke",
            Self::Haze => "Haze",
            Self::Dust => "Dust",
            Self::Fog => "Fog",
            Self::Sand => "Sand",
            Self::Ash => "Ash",
            Self::Squall => "Squall",
            Self::Tornado => "Tornado",
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for WeatherCondition {
    fn from(value: String) -> Self {
        Self::from_main(&value)
    }
}

impl From<&str> for WeatherCondition {
    fn from(value: &str) -> Self {
        Self::from_main(value)
    }
}

impl From<WeatherCondition> for String {
    fn from(condition: WeatherCondition) -> Self {
        condition.name().to_string()
    }
}
