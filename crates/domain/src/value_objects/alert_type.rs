//! Monitored metric an alert refers to

use std::fmt;

use serde::{Deserialize, Serialize};

/// Metric whose sustained breach raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Air temperature in °C
    Temperature,
    /// Wind speed in m/s
    Wind,
    /// Relative humidity in %
    Humidity,
}

impl AlertType {
    /// Unit suffix used when rendering values of this metric
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Wind => " m/s",
            Self::Humidity => "%",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Wind => write!(f, "wind"),
            Self::Humidity => write!(f, "humidity"),
        }
    }
}
