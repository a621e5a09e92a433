//! Consecutive-threshold alert detection
//!
//! Each city keeps one streak per monitored metric. A streak counts readings
//! in a row whose value exceeds the threshold. An alert fires when the count
//! reaches `consecutive_required` and stays silent for the rest of that
//! breach episode. Any reading at or below the threshold resets the count.
//!
//! Settings live behind an [`ArcSwap`] and are loaded once per evaluation, so
//! a live update applies to the next reading without a restart.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use domain::{AlertEvent, AlertType, CityName, DomainError, Reading};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

/// Thresholds and streak length for alert detection
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    /// Temperature in °C a reading must exceed to count as a breach
    pub temperature_threshold: f64,
    /// Breaches in a row needed to raise an alert
    pub consecutive_required: u32,
    /// Optional wind speed threshold in m/s
    pub wind_speed_threshold: Option<f64>,
    /// Optional relative humidity threshold in %
    pub humidity_threshold: Option<f64>,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            temperature_threshold: 35.0,
            consecutive_required: 2,
            wind_speed_threshold: None,
            humidity_threshold: None,
        }
    }
}

impl AlertSettings {
    /// Enabled metrics with their thresholds
    pub fn rules(&self) -> Vec<(AlertType, f64)> {
        let mut rules = vec![(AlertType::Temperature, self.temperature_threshold)];
        if let Some(wind) = self.wind_speed_threshold {
            rules.push((AlertType::Wind, wind));
        }
        if let Some(humidity) = self.humidity_threshold {
            rules.push((AlertType::Humidity, humidity));
        }
        rules
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.consecutive_required == 0 {
            return Err(DomainError::ValidationError(
                "consecutive_required must be at least 1".to_string(),
            ));
        }
        for (alert_type, threshold) in self.rules() {
            if !threshold.is_finite() {
                return Err(DomainError::ValidationError(format!(
                    "{alert_type} threshold must be a finite number"
                )));
            }
        }
        Ok(())
    }
}

/// Streak bookkeeping for one city and metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakState {
    pub consecutive_breaches: u32,
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

/// Observable phase of a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakPhase {
    Normal,
    Breaching(u32),
}

impl StreakState {
    pub const fn phase(&self) -> StreakPhase {
        match self.consecutive_breaches {
            0 => StreakPhase::Normal,
            n => StreakPhase::Breaching(n),
        }
    }
}

type CityStreaks = HashMap<AlertType, StreakState>;

/// Stateful per-city threshold evaluator
pub struct AlertDetector {
    settings: ArcSwap<AlertSettings>,
    streaks: RwLock<HashMap<CityName, Mutex<CityStreaks>>>,
}

impl std::fmt::Debug for AlertDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDetector")
            .field("settings", &self.settings.load_full())
            .field("tracked_cities", &self.streaks.read().len())
            .finish_non_exhaustive()
    }
}

impl AlertDetector {
    /// Create a detector with initial settings
    pub fn new(settings: AlertSettings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            streaks: RwLock::new(HashMap::new()),
        }
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Arc<AlertSettings> {
        self.settings.load_full()
    }

    /// Replace the settings used by subsequent evaluations
    pub fn update_settings(&self, settings: AlertSettings) {
        info!(
            temperature_threshold = settings.temperature_threshold,
            consecutive_required = settings.consecutive_required,
            "Alert settings updated"
        );
        self.settings.store(Arc::new(settings));
    }

    /// Evaluate a reading as of now
    pub fn evaluate(&self, reading: &Reading) -> Vec<AlertEvent> {
        self.evaluate_at(reading, Utc::now())
    }

    /// Evaluate a reading, stamping state and alerts with `now`
    ///
    /// Returns the alerts whose streak reached the required length with this
    /// reading. At most one alert per metric.
    pub fn evaluate_at(&self, reading: &Reading, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let settings = self.settings.load_full();
        let rules = settings.rules();
        self.with_city(&reading.city, |streaks| {
            Self::advance(streaks, reading, &settings, rules, now)
        })
    }

    fn advance(
        streaks: &mut CityStreaks,
        reading: &Reading,
        settings: &AlertSettings,
        rules: Vec<(AlertType, f64)>,
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        streaks.retain(|alert_type, _| rules.iter().any(|(t, _)| t == alert_type));

        let mut alerts = Vec::new();
        for (alert_type, threshold) in rules {
            let value = reading.metric(alert_type);
            let state = streaks.entry(alert_type).or_default();
            state.last_evaluated_at = Some(now);

            if value > threshold {
                state.consecutive_breaches = state.consecutive_breaches.saturating_add(1);
                debug!(
                    city = %reading.city,
                    %alert_type,
                    value,
                    threshold,
                    streak = state.consecutive_breaches,
                    "Threshold breached"
                );

                if state.consecutive_breaches == settings.consecutive_required {
                    info!(
                        city = %reading.city,
                        %alert_type,
                        value,
                        threshold,
                        "Alert raised"
                    );
                    alerts.push(AlertEvent::new(
                        reading.city.clone(),
                        alert_type,
                        threshold,
                        value,
                        now,
                    ));
                }
            } else {
                state.consecutive_breaches = 0;
            }
        }

        alerts
    }

    /// Streak state of a city and metric; default when never evaluated
    pub fn streak(&self, city: &CityName, alert_type: AlertType) -> StreakState {
        self.streaks
            .read()
            .get(city)
            .and_then(|cell| cell.lock().get(&alert_type).copied())
            .unwrap_or_default()
    }

    /// Drop all state for a city. Returns whether any existed.
    pub fn forget(&self, city: &CityName) -> bool {
        self.streaks.write().remove(city).is_some()
    }

    /// Keep state only for the given cities
    pub fn retain_cities(&self, active: &[CityName]) {
        let mut streaks = self.streaks.write();
        let before = streaks.len();
        streaks.retain(|city, _| active.contains(city));
        let dropped = before - streaks.len();
        if dropped > 0 {
            debug!(dropped, "Dropped streak state for inactive cities");
        }
    }

    /// Number of cities with streak state
    pub fn tracked_cities(&self) -> usize {
        self.streaks.read().len()
    }

    /// Run `f` on a city's streaks with the map guard held throughout
    ///
    /// `forget` and `retain_cities` need the write guard, so they can never
    /// drop a cell while an evaluation is updating it.
    fn with_city<R>(&self, city: &CityName, f: impl FnOnce(&mut CityStreaks) -> R) -> R {
        {
            let map = self.streaks.read();
            if let Some(cell) = map.get(city) {
                return f(&mut cell.lock());
            }
        }
        let mut map = self.streaks.write();
        let cell = map.entry(city.clone()).or_default();
        f(&mut cell.lock())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use domain::WeatherCondition;
    use proptest::prelude::*;

    use super::*;

    fn city(name: &str) -> CityName {
        CityName::new(name).unwrap()
    }

    fn reading(name: &str, temperature_c: f64) -> Reading {
        Reading {
            city: city(name),
            condition: WeatherCondition::Clear,
            temperature_c,
            feels_like_c: temperature_c,
            humidity_pct: 40.0,
            wind_speed: 2.0,
            observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn settings(threshold: f64, consecutive_required: u32) -> AlertSettings {
        AlertSettings {
            temperature_threshold: threshold,
            consecutive_required,
            ..AlertSettings::default()
        }
    }

    fn alert_positions(detector: &AlertDetector, temps: &[f64]) -> Vec<usize> {
        temps
            .iter()
            .enumerate()
            .filter(|(_, t)| !detector.evaluate(&reading("Delhi", **t)).is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn fires_once_per_episode() {
        let detector = AlertDetector::new(settings(35.0, 2));
        assert_eq!(alert_positions(&detector, &[34.0, 36.0, 36.0, 36.0]), vec![2]);
    }

    #[test]
    fn below_threshold_resets_streak() {
        let detector = AlertDetector::new(settings(35.0, 2));
        assert_eq!(alert_positions(&detector, &[36.0, 34.0, 36.0, 36.0]), vec![3]);
    }

    #[test]
    fn equal_to_threshold_is_not_a_breach() {
        let detector = AlertDetector::new(settings(35.0, 1));
        assert!(alert_positions(&detector, &[35.0, 35.0]).is_empty());
    }

    #[test]
    fn new_episode_fires_again_after_reset() {
        let detector = AlertDetector::new(settings(35.0, 2));
        assert_eq!(
            alert_positions(&detector, &[36.0, 36.0, 30.0, 36.0, 36.0, 37.0]),
            vec![1, 4]
        );
    }

    #[test]
    fn alert_carries_threshold_and_value() {
        let detector = AlertDetector::new(settings(35.0, 1));
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        let alerts = detector.evaluate_at(&reading("Chennai", 39.5), now);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.city, city("Chennai"));
        assert_eq!(alert.alert_type, AlertType::Temperature);
        assert!((alert.threshold_value - 35.0).abs() < f64::EPSILON);
        assert!((alert.actual_value - 39.5).abs() < f64::EPSILON);
        assert_eq!(alert.raised_at, now);
    }

    #[test]
    fn streak_state_tracks_phase() {
        let detector = AlertDetector::new(settings(35.0, 3));
        let delhi = city("Delhi");
        assert_eq!(
            detector.streak(&delhi, AlertType::Temperature).phase(),
            StreakPhase::Normal
        );

        detector.evaluate(&reading("Delhi", 36.0));
        detector.evaluate(&reading("Delhi", 37.0));
        let state = detector.streak(&delhi, AlertType::Temperature);
        assert_eq!(state.phase(), StreakPhase::Breaching(2));
        assert!(state.last_evaluated_at.is_some());

        detector.evaluate(&reading("Delhi", 20.0));
        assert_eq!(
            detector.streak(&delhi, AlertType::Temperature).phase(),
            StreakPhase::Normal
        );
    }

    #[test]
    fn cities_are_tracked_independently() {
        let detector = AlertDetector::new(settings(30.0, 2));
        detector.evaluate(&reading("Mumbai", 31.0));
        detector.evaluate(&reading("Kolkata", 31.0));
        detector.evaluate(&reading("Kolkata", 25.0));

        assert_eq!(
            detector.streak(&city("Mumbai"), AlertType::Temperature).phase(),
            StreakPhase::Breaching(1)
        );
        assert_eq!(
            detector.streak(&city("Kolkata"), AlertType::Temperature).phase(),
            StreakPhase::Normal
        );
    }

    #[test]
    fn settings_update_applies_to_next_evaluation() {
        let detector = AlertDetector::new(settings(35.0, 2));
        assert!(detector.evaluate(&reading("Delhi", 33.0)).is_empty());

        detector.update_settings(settings(32.0, 1));
        let alerts = detector.evaluate(&reading("Delhi", 33.0));
        assert_eq!(alerts.len(), 1);
        assert!((alerts[0].threshold_value - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_metrics_have_their_own_streaks() {
        let detector = AlertDetector::new(AlertSettings {
            temperature_threshold: 40.0,
            consecutive_required: 1,
            wind_speed_threshold: Some(10.0),
            humidity_threshold: Some(90.0),
        });
        let mut windy = reading("Mumbai", 30.0);
        windy.wind_speed = 15.0;
        windy.humidity_pct = 95.0;

        let alerts = detector.evaluate(&windy);
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(types, vec![AlertType::Wind, AlertType::Humidity]);
    }

    #[test]
    fn disabling_a_metric_drops_its_streak() {
        let detector = AlertDetector::new(AlertSettings {
            wind_speed_threshold: Some(10.0),
            consecutive_required: 3,
            ..AlertSettings::default()
        });
        let mut windy = reading("Mumbai", 20.0);
        windy.wind_speed = 12.0;
        detector.evaluate(&windy);
        assert_eq!(
            detector.streak(&city("Mumbai"), AlertType::Wind).phase(),
            StreakPhase::Breaching(1)
        );

        detector.update_settings(AlertSettings {
            consecutive_required: 3,
            ..AlertSettings::default()
        });
        detector.evaluate(&windy);
        assert_eq!(
            detector.streak(&city("Mumbai"), AlertType::Wind).phase(),
            StreakPhase::Normal
        );
    }

    #[test]
    fn forget_and_retain_drop_state() {
        let detector = AlertDetector::new(settings(30.0, 2));
        detector.evaluate(&reading("A", 31.0));
        detector.evaluate(&reading("B", 31.0));
        detector.evaluate(&reading("C", 31.0));
        assert_eq!(detector.tracked_cities(), 3);

        assert!(detector.forget(&city("A")));
        assert!(!detector.forget(&city("A")));
        detector.retain_cities(&[city("b")]);
        assert_eq!(detector.tracked_cities(), 1);
        assert_eq!(
            detector.streak(&city("B"), AlertType::Temperature).phase(),
            StreakPhase::Breaching(1)
        );
    }

    #[test]
    fn validate_rejects_zero_consecutive_and_nan() {
        assert!(settings(35.0, 0).validate().is_err());
        assert!(settings(f64::NAN, 2).validate().is_err());
        assert!(AlertSettings::default().validate().is_ok());
    }

    #[test]
    fn concurrent_evaluations_of_one_city_do_not_lose_updates() {
        let detector = Arc::new(AlertDetector::new(settings(30.0, 1000)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let detector = Arc::clone(&detector);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        detector.evaluate(&reading("Delhi", 31.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            detector.streak(&city("Delhi"), AlertType::Temperature).phase(),
            StreakPhase::Breaching(800)
        );
    }

    #[test]
    fn pruning_during_evaluation_keeps_active_city_state() {
        let detector = AlertDetector::new(settings(30.0, 1000));
        let active = [city("Delhi")];

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        detector.evaluate(&reading("Delhi", 31.0));
                        detector.evaluate(&reading("Pune", 31.0));
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..200 {
                    detector.retain_cities(&active);
                    detector.forget(&city("Pune"));
                }
            });
        });

        assert_eq!(
            detector.streak(&city("Delhi"), AlertType::Temperature).phase(),
            StreakPhase::Breaching(400)
        );
        detector.retain_cities(&active);
        assert_eq!(detector.tracked_cities(), 1);
    }

    proptest! {
        #[test]
        fn alerts_match_episodes_reaching_required_length(
            temps in prop::collection::vec(prop_oneof![Just(30.0f64), Just(40.0f64)], 0..60),
            required in 1u32..5
        ) {
            let detector = AlertDetector::new(settings(35.0, required));
            let fired = alert_positions(&detector, &temps).len();

            let mut expected = 0;
            let mut run = 0u32;
            for t in &temps {
                if *t > 35.0 {
                    run += 1;
                    if run == required {
                        expected += 1;
                    }
                } else {
                    run = 0;
                }
            }
            prop_assert_eq!(fired, expected);
        }
    }
}
