//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod fetch_client;
mod log_notifier;

pub use fetch_client::{DEFAULT_MAX_CONCURRENT_REQUESTS, FetchClient, FetchClientConfig, FetchStats};
pub use log_notifier::LogNotifier;
