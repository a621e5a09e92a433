//! Weather fetch client - Implements WeatherPort on top of the upstream client
//!
//! Adds the policy the raw OpenWeatherMap client leaves out:
//!
//! - a per-city [`ReadingCache`] consulted before any network call
//! - a process-wide semaphore bounding concurrent upstream requests
//! - exponential backoff for transient failures via [`with_retry`]
//! - a single delayed retry when the provider rate-limits us
//!
//! The semaphore permit is held for one upstream attempt only, never across
//! a backoff or retry-after sleep.

use std::{sync::Arc, time::Duration};

use application::ports::{FetchError, WeatherPort};
use async_trait::async_trait;
use domain::{CityName, Reading, WeatherCondition};
use integration_weather::{Observation, WeatherApiError, WeatherClient};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_TTL, ReadingCache},
    retry::{RetryConfig, with_retry},
};

/// Default number of upstream requests allowed in flight
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Tuning for [`FetchClient`]
#[derive(Debug, Clone)]
pub struct FetchClientConfig {
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub max_concurrent_requests: usize,
    pub retry: RetryConfig,
}

impl Default for FetchClientConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_CAPACITY,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            retry: RetryConfig::default(),
        }
    }
}

/// Snapshot of fetch client counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub cache: CacheStats,
    pub max_concurrent_requests: usize,
    pub available_permits: usize,
    pub shut_down: bool,
}

/// Cached, gated and retrying weather lookup
pub struct FetchClient {
    client: Arc<dyn WeatherClient>,
    cache: ReadingCache,
    gate: Arc<Semaphore>,
    max_concurrent_requests: usize,
    retry: RetryConfig,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("cache", &self.cache)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("available_permits", &self.gate.available_permits())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    pub fn new(client: Arc<dyn WeatherClient>, config: FetchClientConfig) -> Self {
        let max_concurrent_requests = config.max_concurrent_requests.max(1);
        Self {
            client,
            cache: ReadingCache::new(config.cache_ttl, config.cache_capacity),
            gate: Arc::new(Semaphore::new(max_concurrent_requests)),
            max_concurrent_requests,
            retry: config.retry,
        }
    }

    /// Close the concurrency gate
    ///
    /// Callers waiting for a permit, and any later lookups that miss the
    /// cache, fail with [`FetchError::ShuttingDown`]. Requests already in
    /// flight run to completion.
    pub fn shutdown(&self) {
        if !self.gate.is_closed() {
            info!("Closing weather fetch gate");
            self.gate.close();
        }
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            cache: self.cache.stats(),
            max_concurrent_requests: self.max_concurrent_requests,
            available_permits: self.gate.available_permits(),
            shut_down: self.gate.is_closed(),
        }
    }

    /// One gated upstream request
    async fn attempt(&self, city: &CityName) -> Result<Reading, FetchError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| FetchError::ShuttingDown)?;

        let observation = self
            .client
            .current(city.as_str())
            .await
            .map_err(|e| map_error(city, e))?;

        Ok(to_reading(city, observation))
    }
}

#[async_trait]
impl WeatherPort for FetchClient {
    #[instrument(skip(self), fields(city = %city))]
    async fn fetch(&self, city: &CityName) -> Result<Reading, FetchError> {
        if let Some(reading) = self.cache.get(city).await {
            return Ok(reading);
        }

        let outcome = with_retry(&self.retry, || self.attempt(city)).await;
        let result = match outcome.result {
            Err(FetchError::RateLimited { retry_after }) => {
                warn!(
                    retry_after_secs = retry_after.as_secs(),
                    "Rate limited, retrying once after delay"
                );
                tokio::time::sleep(retry_after).await;
                self.attempt(city).await
            },
            other => other,
        };

        let reading = result?;
        debug!(
            attempts = outcome.attempts,
            temperature = reading.temperature_c,
            condition = %reading.condition,
            "Fetched reading"
        );
        self.cache.insert(reading.clone()).await;
        Ok(reading)
    }
}

fn to_reading(city: &CityName, observation: Observation) -> Reading {
    if let Some(resolved) = observation
        .resolved_name
        .as_deref()
        .filter(|name| !name.eq_ignore_ascii_case(city.as_str()))
    {
        debug!(%resolved, "Provider resolved city to a different name");
    }

    Reading {
        city: city.clone(),
        condition: WeatherCondition::from_main(&observation.condition),
        temperature_c: observation.temperature,
        feels_like_c: observation.feels_like,
        humidity_pct: observation.humidity,
        wind_speed: observation.wind_speed,
        observed_at: observation.observed_at,
    }
}

fn map_error(city: &CityName, err: WeatherApiError) -> FetchError {
    match err {
        WeatherApiError::CityNotFound(_) => FetchError::NotFound(city.to_string()),
        WeatherApiError::RateLimited { retry_after_secs } => FetchError::RateLimited {
            retry_after: Duration::from_secs(retry_after_secs),
        },
        WeatherApiError::ServerError { status } => FetchError::Upstream {
            status: Some(status),
            message: "provider returned a server error".to_string(),
        },
        WeatherApiError::RequestRejected { status, message } => FetchError::Upstream {
            status: Some(status),
            message,
        },
        e @ WeatherApiError::Timeout { .. } => FetchError::Timeout(e.to_string()),
        WeatherApiError::ConnectionFailed(message) => FetchError::upstream(message),
        WeatherApiError::ParseError(message) | WeatherApiError::InvalidConfig(message) => {
            FetchError::InvalidResponse(message)
        },
    }
}
