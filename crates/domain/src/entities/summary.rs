//! Aggregated views over a window of readings

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{scoring::ScoreResult, value_objects::CityName};

/// Minimum, maximum and mean of one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl MetricStats {
    /// Compute statistics, or `None` for an empty input
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0_u32;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        (count > 0).then(|| Self {
            min,
            max,
            avg: sum / f64::from(count),
        })
    }
}

/// Daily summary for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub city: CityName,
    pub date: NaiveDate,
    pub reading_count: usize,
    pub temperature: MetricStats,
    pub humidity: MetricStats,
    pub wind_speed: MetricStats,
    /// Dominant condition analysis for the day
    pub analysis: ScoreResult,
}

/// Direction of the temperature over a trend window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Steady,
}

impl TrendDirection {
    /// Compare the last value of a window against the first
    pub fn between(first: f64, last: f64) -> Self {
        if last > first {
            Self::Rising
        } else if last < first {
            Self::Falling
        } else {
            Self::Steady
        }
    }
}

/// Temperature statistics with their direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTrend {
    #[serde(flatten)]
    pub stats: MetricStats,
    pub direction: TrendDirection,
}

/// Multi-day trend view for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTrends {
    pub city: CityName,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub reading_count: usize,
    pub temperature: TemperatureTrend,
    pub humidity: MetricStats,
    pub wind_speed: MetricStats,
    /// Number of readings per condition name
    pub condition_distribution: BTreeMap<String, usize>,
}
