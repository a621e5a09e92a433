//! Alert detection and scoring configuration

use std::collections::HashMap;

use application::AlertSettings;
use chrono::Duration;
use domain::{ConditionScorer, SeverityTable, scoring::DEFAULT_CONTINUITY_GAP_HOURS};
use serde::{Deserialize, Serialize};

/// Thresholds for the alert detector
///
/// Wind and humidity rules are off unless a threshold is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsAppConfig {
    /// Temperature in °C a reading must exceed (default: 35.0)
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold: f64,

    /// Breaches in a row before an alert fires (default: 2)
    #[serde(default = "default_consecutive_required")]
    pub consecutive_required: u32,

    #[serde(default)]
    pub wind_speed_threshold: Option<f64>,

    #[serde(default)]
    pub humidity_threshold: Option<f64>,
}

const fn default_temperature_threshold() -> f64 {
    35.0
}

const fn default_consecutive_required() -> u32 {
    2
}

impl Default for AlertsAppConfig {
    fn default() -> Self {
        Self {
            temperature_threshold: default_temperature_threshold(),
            consecutive_required: default_consecutive_required(),
            wind_speed_threshold: None,
            humidity_threshold: None,
        }
    }
}

impl From<&AlertsAppConfig> for AlertSettings {
    fn from(config: &AlertsAppConfig) -> Self {
        Self {
            temperature_threshold: config.temperature_threshold,
            consecutive_required: config.consecutive_required,
            wind_speed_threshold: config.wind_speed_threshold,
            humidity_threshold: config.humidity_threshold,
        }
    }
}

/// Condition scoring parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringAppConfig {
    /// Largest gap in hours that still continues a condition run (default: 6)
    #[serde(default = "default_continuity_gap")]
    pub continuity_gap_hours: u32,

    /// Severity overrides by condition group, e.g. `Rain = 4`
    #[serde(default)]
    pub severity_weights: HashMap<String, u32>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn default_continuity_gap() -> u32 {
    DEFAULT_CONTINUITY_GAP_HOURS as u32
}

impl Default for ScoringAppConfig {
    fn default() -> Self {
        Self {
            continuity_gap_hours: default_continuity_gap(),
            severity_weights: HashMap::new(),
        }
    }
}

impl ScoringAppConfig {
    pub fn scorer(&self) -> ConditionScorer {
        let severity = SeverityTable::default().with_overrides(&self.severity_weights);
        ConditionScorer::new(
            severity,
            Duration::hours(i64::from(self.continuity_gap_hours)),
        )
    }
}
