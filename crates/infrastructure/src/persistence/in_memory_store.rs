//! In-memory implementation of the store port
//!
//! Keeps the active city list, a time-ordered reading history per city and
//! the alert log behind `parking_lot` locks. Readings older than the
//! retention window (measured from the newest reading of that city) are
//! pruned on write.

use std::collections::HashMap;

use application::{error::ApplicationError, ports::StorePort};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain::{AlertEvent, CityName, Reading};
use parking_lot::RwLock;
use tracing::{debug, instrument};

/// Default history kept per city, enough for a week of trends
pub const DEFAULT_RETENTION_DAYS: i64 = 8;

/// Thread-safe in-process store
#[derive(Debug)]
pub struct InMemoryStore {
    cities: RwLock<Vec<CityName>>,
    readings: RwLock<HashMap<String, Vec<Reading>>>,
    alerts: RwLock<Vec<AlertEvent>>,
    retention: Duration,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl InMemoryStore {
    /// Create a store seeded with the cities to poll
    pub fn new(cities: Vec<CityName>) -> Self {
        Self {
            cities: RwLock::new(cities),
            readings: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Start polling a city. Returns false if it is already active.
    pub fn add_city(&self, city: CityName) -> bool {
        let mut cities = self.cities.write();
        if cities.contains(&city) {
            return false;
        }
        cities.push(city);
        true
    }

    /// Stop polling a city. History is kept.
    pub fn remove_city(&self, city: &CityName) -> bool {
        let mut cities = self.cities.write();
        let before = cities.len();
        cities.retain(|c| c != city);
        cities.len() != before
    }

    /// Replace the active city list
    pub fn set_cities(&self, cities: Vec<CityName>) {
        *self.cities.write() = cities;
    }

    /// Alerts recorded so far, oldest first
    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.read().clone()
    }

    /// Number of readings held for a city
    pub fn reading_count(&self, city: &CityName) -> usize {
        self.readings.read().get(&city.key()).map_or(0, Vec::len)
    }

    /// Most recent reading for a city
    pub fn latest(&self, city: &CityName) -> Option<Reading> {
        self.readings
            .read()
            .get(&city.key())
            .and_then(|history| history.last().cloned())
    }
}

#[async_trait]
impl StorePort for InMemoryStore {
    async fn list_active_cities(&self) -> Result<Vec<CityName>, ApplicationError> {
        Ok(self.cities.read().clone())
    }

    #[instrument(skip(self, reading), fields(city = %reading.city), level = "debug")]
    async fn save_reading(&self, reading: &Reading) -> Result<(), ApplicationError> {
        let mut readings = self.readings.write();
        let history = readings.entry(reading.city.key()).or_default();

        let at = history.partition_point(|r| r.observed_at <= reading.observed_at);
        history.insert(at, reading.clone());

        if let Some(newest) = history.last().map(|r| r.observed_at) {
            let cutoff = newest - self.retention;
            let expired = history.partition_point(|r| r.observed_at < cutoff);
            if expired > 0 {
                history.drain(..expired);
                debug!(expired, "Pruned readings past retention");
            }
        }
        Ok(())
    }

    async fn save_alert(&self, alert: &AlertEvent) -> Result<(), ApplicationError> {
        self.alerts.write().push(alert.clone());
        Ok(())
    }

    async fn readings_between(
        &self,
        city: &CityName,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, ApplicationError> {
        let readings = self.readings.read();
        let Some(history) = readings.get(&city.key()) else {
            return Ok(Vec::new());
        };

        let from = history.partition_point(|r| r.observed_at < start);
        let to = history.partition_point(|r| r.observed_at < end);
        Ok(history.get(from..to).map(<[Reading]>::to_vec).unwrap_or_default())
    }
}
