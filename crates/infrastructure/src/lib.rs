//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: the cached and
//! rate-limited weather fetch client, the in-memory store and the log
//! notifier. Also owns configuration loading and logging setup.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod persistence;
pub mod retry;
pub mod telemetry;

pub use adapters::*;
pub use cache::{CacheStats, ReadingCache};
pub use config::{AppConfig, ConfigError, ConfigSource};
pub use persistence::InMemoryStore;
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
