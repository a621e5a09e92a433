//! Alert event entity - a sustained threshold breach for one city

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertId, AlertType, CityName};

/// An alert raised when a metric breached its threshold for the required
/// number of consecutive readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: AlertId,
    pub city: CityName,
    pub alert_type: AlertType,
    pub threshold_value: f64,
    pub actual_value: f64,
    pub raised_at: DateTime<Utc>,
}

impl AlertEvent {
    /// Create a new alert with a fresh ID
    pub fn new(
        city: CityName,
        alert_type: AlertType,
        threshold_value: f64,
        actual_value: f64,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::new(),
            city,
            alert_type,
            threshold_value,
            actual_value,
            raised_at,
        }
    }

    /// Human-readable text for notification channels
    pub fn message(&self) -> String {
        let unit = self.alert_type.unit();
        format!(
            "{} alert for {}: {:.1}{unit} exceeds threshold of {:.1}{unit}",
            capitalize(&self.alert_type.to_string()),
            self.city,
            self.actual_value,
            self.threshold_value,
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_renders_values_with_unit() {
        let alert = AlertEvent::new(
            CityName::new("Chennai").unwrap(),
            AlertType::Temperature,
            35.0,
            36.24,
            Utc::now(),
        );
        assert_eq!(
            alert.message(),
            "Temperature alert for Chennai: 36.2°C exceeds threshold of 35.0°C"
        );
    }

    #[test]
    fn wind_message_uses_speed_unit() {
        let alert = AlertEvent::new(
            CityName::new("Mumbai").unwrap(),
            AlertType::Wind,
            10.0,
            14.0,
            Utc::now(),
        );
        assert!(alert.message().contains("14.0 m/s"));
    }

    #[test]
    fn each_alert_gets_its_own_id() {
        let city = CityName::new("Kolkata").unwrap();
        let a = AlertEvent::new(city.clone(), AlertType::Humidity, 90.0, 95.0, Utc::now());
        let b = AlertEvent::new(city, AlertType::Humidity, 90.0, 95.0, Utc::now());
        assert_ne!(a.id, b.id);
    }
}
