//! Fetch, retry and scheduler configuration

use std::time::Duration;

use application::{DEFAULT_FETCH_TIMEOUT, IngestionConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::{DEFAULT_MAX_CONCURRENT_REQUESTS, FetchClientConfig},
    cache::{DEFAULT_CAPACITY, DEFAULT_TTL},
    retry::RetryConfig,
};

// ==============================
// Fetch Configuration
// ==============================

/// Cache and concurrency settings of the fetch client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchAppConfig {
    /// Seconds a fetched reading is served from cache (default: 300)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached cities (default: 100)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Upstream requests allowed in flight (default: 10)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

const fn default_cache_ttl() -> u64 {
    DEFAULT_TTL.as_secs()
}

const fn default_cache_capacity() -> u64 {
    DEFAULT_CAPACITY
}

const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

impl Default for FetchAppConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

// ==============================
// Retry Configuration
// ==============================

/// Backoff settings for transient upstream failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryAppConfig {
    /// Delay before the second attempt in milliseconds (default: 1000ms)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Cap on a single delay in milliseconds (default: 10000ms)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Total attempts including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Time budget across all attempts in seconds (default: 30)
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_secs: u64,
}

const fn default_initial_delay() -> u64 {
    1_000
}

const fn default_max_delay() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_max_elapsed() -> u64 {
    30
}

impl Default for RetryAppConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
            max_elapsed_secs: default_max_elapsed(),
        }
    }
}

impl From<&RetryAppConfig> for RetryConfig {
    fn from(config: &RetryAppConfig) -> Self {
        Self {
            initial_delay_ms: config.initial_delay_ms,
            max_delay_ms: config.max_delay_ms,
            multiplier: config.multiplier,
            max_attempts: config.max_attempts,
            max_elapsed_ms: config.max_elapsed_secs.saturating_mul(1_000),
            ..Self::default()
        }
    }
}

// ==============================
// Scheduler Configuration
// ==============================

/// Polling loop timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerAppConfig {
    /// Seconds between the end of one cycle and the start of the next (default: 300)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound on one city's fetch in seconds, retries and rate-limit
    /// wait included (default: 180)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Seconds an in-flight cycle may run after shutdown (default: 10)
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

const fn default_poll_interval() -> u64 {
    300
}

const fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

const fn default_shutdown_grace() -> u64 {
    10
}

impl Default for SchedulerAppConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl SchedulerAppConfig {
    pub const fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }

    pub const fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

/// Combine the fetch and retry sections into the fetch client's settings
pub fn fetch_client_config(fetch: &FetchAppConfig, retry: &RetryAppConfig) -> FetchClientConfig {
    FetchClientConfig {
        cache_ttl: Duration::from_secs(fetch.cache_ttl_secs),
        cache_capacity: fetch.cache_capacity,
        max_concurrent_requests: fetch.max_concurrent_requests,
        retry: RetryConfig::from(retry),
    }
}
