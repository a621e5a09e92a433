//! In-memory collaborators for pipeline tests

use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use domain::{AlertEvent, CityName, Reading, WeatherCondition};
use parking_lot::Mutex;

use crate::{
    error::ApplicationError,
    ports::{DeliveryError, FetchError, NotifierPort, StorePort, WeatherPort},
};

pub fn city(name: &str) -> CityName {
    CityName::new(name).unwrap()
}

pub fn reading(name: &str, temperature_c: f64) -> Reading {
    Reading {
        city: city(name),
        condition: WeatherCondition::Clear,
        temperature_c,
        feels_like_c: temperature_c,
        humidity_pct: 45.0,
        wind_speed: 3.0,
        observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

/// Weather source answering from a per-city script of temperatures
#[derive(Default)]
pub struct ScriptedWeather {
    scripts: Mutex<HashMap<String, VecDeque<Result<f64, FetchError>>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    panic_on_call: Option<usize>,
}

impl ScriptedWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temps(self, name: &str, temps: &[f64]) -> Self {
        self.scripts
            .lock()
            .entry(city(name).key())
            .or_default()
            .extend(temps.iter().copied().map(Ok));
        self
    }

    pub fn with_error(self, name: &str, error: FetchError) -> Self {
        self.scripts
            .lock()
            .entry(city(name).key())
            .or_default()
            .push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic on the n-th call (1-based)
    pub fn panicking_on_call(mut self, n: usize) -> Self {
        self.panic_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherPort for ScriptedWeather {
    async fn fetch(&self, city: &CityName) -> Result<Reading, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        assert!(self.panic_on_call != Some(call), "scripted panic");

        let next = self
            .scripts
            .lock()
            .get_mut(&city.key())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(temp)) => Ok(reading(city.as_str(), temp)),
            Some(Err(e)) => Err(e),
            None => Err(FetchError::NotFound(city.to_string())),
        }
    }
}

/// Store keeping everything in vectors
#[derive(Default)]
pub struct RecordingStore {
    pub cities: Mutex<Vec<CityName>>,
    pub readings: Mutex<Vec<Reading>>,
    pub alerts: Mutex<Vec<AlertEvent>>,
    pub fail_readings: bool,
}

impl RecordingStore {
    pub fn with_cities(names: &[&str]) -> Self {
        Self {
            cities: Mutex::new(names.iter().map(|n| city(n)).collect()),
            ..Self::default()
        }
    }

    pub fn reading_count(&self) -> usize {
        self.readings.lock().len()
    }

    pub fn alert_cities(&self) -> Vec<CityName> {
        self.alerts.lock().iter().map(|a| a.city.clone()).collect()
    }
}

#[async_trait]
impl StorePort for RecordingStore {
    async fn list_active_cities(&self) -> Result<Vec<CityName>, ApplicationError> {
        Ok(self.cities.lock().clone())
    }

    async fn save_reading(&self, reading: &Reading) -> Result<(), ApplicationError> {
        if self.fail_readings {
            return Err(ApplicationError::Storage("readings table locked".to_string()));
        }
        self.readings.lock().push(reading.clone());
        Ok(())
    }

    async fn save_alert(&self, alert: &AlertEvent) -> Result<(), ApplicationError> {
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    async fn readings_between(
        &self,
        city: &CityName,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, ApplicationError> {
        Ok(self
            .readings
            .lock()
            .iter()
            .filter(|r| &r.city == city && r.observed_at >= start && r.observed_at < end)
            .cloned()
            .collect())
    }
}

/// Notifier remembering what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<AlertEvent>>,
    pub fail: bool,
}

#[async_trait]
impl NotifierPort for RecordingNotifier {
    async fn send(&self, alert: &AlertEvent) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Unavailable("test channel down".to_string()));
        }
        self.sent.lock().push(alert.clone());
        Ok(())
    }
}
