//! One ingestion cycle
//!
//! Lists the active cities, fetches every city concurrently, stores each
//! reading, runs alert detection and dispatches any raised alerts. A failing
//! city is recorded in the [`CycleReport`] and never affects the others.

use std::{collections::HashSet, sync::Arc, time::Duration};

use domain::{AlertEvent, CityName};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{FetchError, StorePort, WeatherPort},
    services::{AlertDetector, AlertDispatcher},
};

/// Default upper bound on one city's fetch
///
/// Must cover the fetch client's whole retry budget plus a provider
/// `Retry-After` wait (60s unless the server says otherwise) and the
/// attempt that follows it.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(180);

/// Tuning for a single cycle
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Upper bound on one city's fetch, retries and rate-limit wait included
    pub fetch_timeout: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// A city whose processing failed during a cycle
#[derive(Debug)]
pub struct CityFailure {
    pub city: CityName,
    pub error: ApplicationError,
}

/// Result of one ingestion cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub cities_attempted: usize,
    pub readings_stored: usize,
    pub alerts: Vec<AlertEvent>,
    pub failures: Vec<CityFailure>,
}

impl CycleReport {
    /// Cities with at least one failure
    pub fn failed_cities(&self) -> Vec<&CityName> {
        self.failures.iter().map(|f| &f.city).collect()
    }
}

struct CityOutcome {
    city: CityName,
    stored: bool,
    alerts: Vec<AlertEvent>,
    error: Option<ApplicationError>,
}

impl CityOutcome {
    fn failed(city: CityName, error: ApplicationError) -> Self {
        Self {
            city,
            stored: false,
            alerts: Vec::new(),
            error: Some(error),
        }
    }
}

/// Fetch, store and evaluate all active cities once
pub struct IngestionService {
    weather: Arc<dyn WeatherPort>,
    store: Arc<dyn StorePort>,
    detector: Arc<AlertDetector>,
    dispatcher: AlertDispatcher,
    config: IngestionConfig,
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("config", &self.config)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl IngestionService {
    pub fn new(
        weather: Arc<dyn WeatherPort>,
        store: Arc<dyn StorePort>,
        detector: Arc<AlertDetector>,
        dispatcher: AlertDispatcher,
        config: IngestionConfig,
    ) -> Self {
        Self {
            weather,
            store,
            detector,
            dispatcher,
            config,
        }
    }

    /// The detector fed by this service
    pub fn detector(&self) -> &Arc<AlertDetector> {
        &self.detector
    }

    /// Run one cycle over the active cities
    ///
    /// Fails only when the city list itself cannot be read; per-city
    /// problems are reported in the returned [`CycleReport`].
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport, ApplicationError> {
        let cities = dedupe(self.store.list_active_cities().await?);
        debug!(count = cities.len(), "Starting ingestion cycle");

        let outcomes = join_all(cities.iter().cloned().map(|city| self.process_city(city))).await;

        let mut report = CycleReport {
            cities_attempted: cities.len(),
            ..CycleReport::default()
        };
        for outcome in outcomes {
            if outcome.stored {
                report.readings_stored += 1;
            }
            report.alerts.extend(outcome.alerts);
            if let Some(error) = outcome.error {
                report.failures.push(CityFailure {
                    city: outcome.city,
                    error,
                });
            }
        }

        self.detector.retain_cities(&cities);

        info!(
            cities = report.cities_attempted,
            stored = report.readings_stored,
            alerts = report.alerts.len(),
            failures = report.failures.len(),
            "Ingestion cycle complete"
        );
        Ok(report)
    }

    async fn process_city(&self, city: CityName) -> CityOutcome {
        let fetched = tokio::time::timeout(self.config.fetch_timeout, self.weather.fetch(&city))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout(format!(
                    "no reading within {}s",
                    self.config.fetch_timeout.as_secs()
                )))
            });

        let reading = match fetched {
            Ok(reading) => reading,
            Err(e) => {
                warn!(city = %city, error = %e, "Weather fetch failed");
                return CityOutcome::failed(city, e.into());
            },
        };

        let mut outcome = CityOutcome {
            city,
            stored: false,
            alerts: Vec::new(),
            error: None,
        };

        match self.store.save_reading(&reading).await {
            Ok(()) => outcome.stored = true,
            Err(e) => {
                warn!(city = %outcome.city, error = %e, "Failed to store reading");
                outcome.error = Some(e);
            },
        }

        for alert in self.detector.evaluate(&reading) {
            self.dispatcher.dispatch(&alert).await;
            outcome.alerts.push(alert);
        }

        outcome
    }
}

/// Remove repeated cities, keeping first-seen order
fn dedupe(cities: Vec<CityName>) -> Vec<CityName> {
    let mut seen = HashSet::with_capacity(cities.len());
    cities
        .into_iter()
        .filter(|city| seen.insert(city.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use domain::AlertType;

    use super::*;
    use crate::{
        services::{AlertSettings, StreakPhase},
        test_support::{RecordingNotifier, RecordingStore, ScriptedWeather, city},
    };

    struct Harness {
        weather: Arc<ScriptedWeather>,
        store: Arc<RecordingStore>,
        notifier: Arc<RecordingNotifier>,
        service: IngestionService,
    }

    fn harness(
        weather: ScriptedWeather,
        store: RecordingStore,
        notifier: RecordingNotifier,
        settings: AlertSettings,
    ) -> Harness {
        let weather = Arc::new(weather);
        let store = Arc::new(store);
        let notifier = Arc::new(notifier);
        let dispatcher = AlertDispatcher::new(store.clone(), notifier.clone());
        let service = IngestionService::new(
            weather.clone(),
            store.clone(),
            Arc::new(AlertDetector::new(settings)),
            dispatcher,
            IngestionConfig::default(),
        );
        Harness {
            weather,
            store,
            notifier,
            service,
        }
    }

    fn threshold(temperature_threshold: f64, consecutive_required: u32) -> AlertSettings {
        AlertSettings {
            temperature_threshold,
            consecutive_required,
            ..AlertSettings::default()
        }
    }

    #[tokio::test]
    async fn alerts_follow_the_breaching_city_across_cycles() {
        let h = harness(
            ScriptedWeather::new()
                .with_temps("A", &[31.0, 29.0])
                .with_temps("B", &[29.0, 31.0]),
            RecordingStore::with_cities(&["A", "B"]),
            RecordingNotifier::default(),
            threshold(30.0, 1),
        );

        let first = h.service.run_cycle().await.unwrap();
        assert_eq!(first.alerts.len(), 1);
        assert_eq!(first.alerts[0].city, city("A"));

        let second = h.service.run_cycle().await.unwrap();
        assert_eq!(second.alerts.len(), 1);
        assert_eq!(second.alerts[0].city, city("B"));

        assert_eq!(
            h.service
                .detector()
                .streak(&city("A"), AlertType::Temperature)
                .phase(),
            StreakPhase::Normal
        );
        assert_eq!(h.store.alert_cities(), vec![city("A"), city("B")]);
        assert_eq!(h.notifier.sent.lock().len(), 2);
        assert_eq!(h.store.reading_count(), 4);
    }

    #[tokio::test]
    async fn failing_city_does_not_affect_others() {
        let h = harness(
            ScriptedWeather::new()
                .with_temps("Delhi", &[36.0])
                .with_error("Atlantis", FetchError::NotFound("Atlantis".to_string()))
                .with_error("Mumbai", FetchError::upstream("connection reset")),
            RecordingStore::with_cities(&["Delhi", "Atlantis", "Mumbai"]),
            RecordingNotifier::default(),
            threshold(35.0, 1),
        );

        let report = h.service.run_cycle().await.unwrap();

        assert_eq!(report.cities_attempted, 3);
        assert_eq!(report.readings_stored, 1);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.failed_cities(), vec![&city("Atlantis"), &city("Mumbai")]);
        assert!(matches!(
            report.failures[0].error,
            ApplicationError::Fetch(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_cities_are_fetched_once() {
        let h = harness(
            ScriptedWeather::new().with_temps("Chennai", &[30.0, 30.0]),
            RecordingStore::with_cities(&["Chennai", "chennai", "CHENNAI"]),
            RecordingNotifier::default(),
            AlertSettings::default(),
        );

        let report = h.service.run_cycle().await.unwrap();

        assert_eq!(report.cities_attempted, 1);
        assert_eq!(h.weather.calls(), 1);
    }

    #[tokio::test]
    async fn store_failure_still_evaluates_alerts() {
        let store = RecordingStore {
            fail_readings: true,
            ..RecordingStore::with_cities(&["Delhi"])
        };
        let h = harness(
            ScriptedWeather::new().with_temps("Delhi", &[40.0]),
            store,
            RecordingNotifier::default(),
            threshold(35.0, 1),
        );

        let report = h.service.run_cycle().await.unwrap();

        assert_eq!(report.readings_stored, 0);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, ApplicationError::Storage(_)));
    }

    #[tokio::test]
    async fn delivery_failure_keeps_alert_record() {
        let h = harness(
            ScriptedWeather::new().with_temps("Kolkata", &[37.0]),
            RecordingStore::with_cities(&["Kolkata"]),
            RecordingNotifier {
                fail: true,
                ..RecordingNotifier::default()
            },
            threshold(35.0, 1),
        );

        let report = h.service.run_cycle().await.unwrap();

        assert_eq!(report.alerts.len(), 1);
        assert!(report.failures.is_empty());
        assert_eq!(h.store.alerts.lock().len(), 1);
        assert!(h.notifier.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_city_times_out_individually() {
        let weather = Arc::new(
            ScriptedWeather::new()
                .with_temps("Delhi", &[30.0])
                .with_delay(Duration::from_secs(120)),
        );
        let store = Arc::new(RecordingStore::with_cities(&["Delhi"]));
        let dispatcher = AlertDispatcher::new(store.clone(), Arc::new(RecordingNotifier::default()));
        let service = IngestionService::new(
            weather,
            store,
            Arc::new(AlertDetector::new(AlertSettings::default())),
            dispatcher,
            IngestionConfig {
                fetch_timeout: Duration::from_secs(5),
            },
        );

        let report = service.run_cycle().await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            ApplicationError::Fetch(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn removed_cities_lose_streak_state() {
        let h = harness(
            ScriptedWeather::new()
                .with_temps("A", &[36.0])
                .with_temps("B", &[36.0, 36.0]),
            RecordingStore::with_cities(&["A", "B"]),
            RecordingNotifier::default(),
            threshold(35.0, 3),
        );

        h.service.run_cycle().await.unwrap();
        assert_eq!(h.service.detector().tracked_cities(), 2);

        *h.store.cities.lock() = vec![city("B")];
        h.service.run_cycle().await.unwrap();

        assert_eq!(h.service.detector().tracked_cities(), 1);
        assert_eq!(
            h.service
                .detector()
                .streak(&city("B"), AlertType::Temperature)
                .phase(),
            StreakPhase::Breaching(2)
        );
    }

    #[test]
    fn dedupe_keeps_first_seen_order() {
        let cities = vec![city("B"), city("A"), city("b"), city("C"), city("a")];
        assert_eq!(dedupe(cities), vec![city("B"), city("A"), city("C")]);
    }
}
