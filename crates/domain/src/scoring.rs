//! Time-decayed, severity-weighted dominant condition scoring
//!
//! Each reading contributes `severity(condition) / (1 + age_hours)` to its
//! condition's score. The condition with the largest score is dominant;
//! ties go to the condition seen first in chronological order.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use domain::{CityName, ConditionScorer, Reading, WeatherCondition};
//!
//! let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
//! let reading = |hours_ago: i64, condition| Reading {
//!     city: CityName::new("Mumbai").unwrap(),
//!     condition,
//!     temperature_c: 29.0,
//!     feels_like_c: 33.0,
//!     humidity_pct: 84.0,
//!     wind_speed: 5.1,
//!     observed_at: now - Duration::hours(hours_ago),
//! };
//!
//! let readings = vec![
//!     reading(4, WeatherCondition::Clouds),
//!     reading(2, WeatherCondition::Rain),
//!     reading(0, WeatherCondition::Rain),
//! ];
//!
//! let result = ConditionScorer::default().score(&readings, now);
//! assert_eq!(result.dominant_condition, Some(WeatherCondition::Rain));
//! assert!((result.duration_hours - 2.0).abs() < f64::EPSILON);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{entities::Reading, value_objects::WeatherCondition};

/// Weight applied to conditions missing from the table
pub const DEFAULT_SEVERITY: u32 = 1;

/// Default maximum gap between two occurrences of a condition that still
/// counts as one continuous run
pub const DEFAULT_CONTINUITY_GAP_HOURS: i64 = 6;

/// Severity weight per condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityTable {
    weights: HashMap<WeatherCondition, u32>,
}

impl SeverityTable {
    /// Table with no entries; every condition weighs [`DEFAULT_SEVERITY`]
    pub fn empty() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    /// Set the weight of one condition
    #[must_use]
    pub fn with_weight(mut self, condition: WeatherCondition, weight: u32) -> Self {
        self.weights.insert(condition, weight);
        self
    }

    /// Apply overrides keyed by provider group name, e.g. `"Rain" => 4`
    #[must_use]
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a u32)>,
    {
        for (name, weight) in overrides {
            self.weights
                .insert(WeatherCondition::from_main(name), *weight);
        }
        self
    }

    /// Weight of a condition
    pub fn weight(&self, condition: &WeatherCondition) -> u32 {
        self.weights
            .get(condition)
            .copied()
            .unwrap_or(DEFAULT_SEVERITY)
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::empty()
            .with_weight(WeatherCondition::Thunderstorm, 5)
            .with_weight(WeatherCondition::Snow, 4)
            .with_weight(WeatherCondition::Rain, 3)
            .with_weight(WeatherCondition::Drizzle, 2)
            .with_weight(WeatherCondition::Fog, 2)
            .with_weight(WeatherCondition::Clouds, 1)
            .with_weight(WeatherCondition::Clear, 1)
            .with_weight(WeatherCondition::Mist, 1)
            .with_weight(WeatherCondition::Haze, 1)
    }
}

/// Outcome of scoring a window of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// `None` only for an empty window
    pub dominant_condition: Option<WeatherCondition>,
    /// Share of the total weight held by the dominant condition, 0-100,
    /// rounded to two decimals
    pub confidence_pct: f64,
    /// Longest continuous run of the dominant condition, rounded to one
    /// decimal
    pub duration_hours: f64,
    /// Severity weight of the dominant condition, 0 when there is none
    pub severity_level: u32,
}

impl ScoreResult {
    /// Result for an empty window
    pub const fn empty() -> Self {
        Self {
            dominant_condition: None,
            confidence_pct: 0.0,
            duration_hours: 0.0,
            severity_level: 0,
        }
    }
}

/// Pure dominant-condition scorer
#[derive(Debug, Clone)]
pub struct ConditionScorer {
    severity: SeverityTable,
    continuity_gap: Duration,
}

impl Default for ConditionScorer {
    fn default() -> Self {
        Self::new(
            SeverityTable::default(),
            Duration::hours(DEFAULT_CONTINUITY_GAP_HOURS),
        )
    }
}

impl ConditionScorer {
    /// Create a scorer with an explicit severity table and continuity gap
    pub const fn new(severity: SeverityTable, continuity_gap: Duration) -> Self {
        Self {
            severity,
            continuity_gap,
        }
    }

    /// The severity table in use
    pub const fn severity(&self) -> &SeverityTable {
        &self.severity
    }

    /// Score a window of readings as of `evaluation_time`
    ///
    /// Readings are processed in `observed_at` order; readings sharing a
    /// timestamp keep their input order.
    pub fn score(&self, readings: &[Reading], evaluation_time: DateTime<Utc>) -> ScoreResult {
        if readings.is_empty() {
            return ScoreResult::empty();
        }

        let mut ordered: Vec<&Reading> = readings.iter().collect();
        ordered.sort_by_key(|r| r.observed_at);

        // Insertion order doubles as the tie-break order.
        let mut sums: Vec<(&WeatherCondition, f64)> = Vec::new();
        let mut total = 0.0;

        for reading in &ordered {
            let weight = time_weight(evaluation_time, reading.observed_at)
                * f64::from(self.severity.weight(&reading.condition));
            total += weight;

            match sums.iter_mut().find(|(c, _)| *c == &reading.condition) {
                Some((_, sum)) => *sum += weight,
                None => sums.push((&reading.condition, weight)),
            }
        }

        let mut dominant: Option<(&WeatherCondition, f64)> = None;
        for &(condition, sum) in &sums {
            if dominant.is_none_or(|(_, best)| sum > best) {
                dominant = Some((condition, sum));
            }
        }

        let Some((condition, dominant_sum)) = dominant else {
            return ScoreResult::empty();
        };

        let confidence = if total > 0.0 {
            100.0 * dominant_sum / total
        } else {
            0.0
        };

        ScoreResult {
            dominant_condition: Some(condition.clone()),
            confidence_pct: round_to(confidence, 2),
            duration_hours: round_to(self.longest_run_hours(&ordered, condition), 1),
            severity_level: self.severity.weight(condition),
        }
    }

    /// Longest run of `condition` in a time-sorted sequence. A different
    /// condition or a gap above the continuity limit ends the run.
    fn longest_run_hours(&self, ordered: &[&Reading], condition: &WeatherCondition) -> f64 {
        let mut longest = Duration::zero();
        let mut current = Duration::zero();
        let mut previous: Option<DateTime<Utc>> = None;

        for reading in ordered {
            if &reading.condition != condition {
                current = Duration::zero();
                previous = None;
                continue;
            }

            if let Some(prev) = previous {
                let gap = reading.observed_at - prev;
                if gap <= self.continuity_gap {
                    current += gap;
                } else {
                    current = Duration::zero();
                }
            }
            previous = Some(reading.observed_at);
            longest = longest.max(current);
        }

        hours(longest)
    }
}

/// `1 / (1 + age_hours)`, with readings from the future treated as age 0
fn time_weight(evaluation_time: DateTime<Utc>, observed_at: DateTime<Utc>) -> f64 {
    let age = hours(evaluation_time - observed_at).max(0.0);
    1.0 / (1.0 + age)
}

#[allow(clippy::cast_precision_loss)]
fn hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
