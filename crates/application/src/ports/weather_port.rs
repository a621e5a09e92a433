//! Weather lookup port
//!
//! Defines the single-city retrieval contract the scheduler fans out over.

use std::time::Duration;

use async_trait::async_trait;
use domain::{CityName, Reading};
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Failure taxonomy of a weather lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The provider does not know the city
    #[error("City not found upstream: {0}")]
    NotFound(String),

    /// The provider throttled the request
    #[error("Rate limited upstream, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The provider failed or could not be reached
    #[error("Upstream error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// The provider answered but the body could not be decoded
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// No response within the deadline
    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    /// The client was shut down while the call was waiting
    #[error("Weather client is shutting down")]
    ShuttingDown,
}

impl FetchError {
    /// Create an upstream error without an HTTP status
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// Whether backing off and trying again can help
    ///
    /// Timeouts, connection failures and 5xx responses are transient. A rate
    /// limit is handled separately through its retry-after delay.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Upstream { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500,
            },
            Self::NotFound(_)
            | Self::RateLimited { .. }
            | Self::InvalidResponse(_)
            | Self::ShuttingDown => false,
        }
    }
}

/// Port for single-city weather retrieval
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherPort: Send + Sync {
    /// Fetch the current reading for a city
    async fn fetch(&self, city: &CityName) -> Result<Reading, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn WeatherPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WeatherPort>();
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout("t".to_string()).is_transient());
        assert!(FetchError::upstream("connection reset").is_transient());
        assert!(
            FetchError::Upstream {
                status: Some(503),
                message: "unavailable".to_string()
            }
            .is_transient()
        );
        assert!(
            !FetchError::Upstream {
                status: Some(401),
                message: "bad key".to_string()
            }
            .is_transient()
        );
        assert!(!FetchError::NotFound("x".to_string()).is_transient());
        assert!(!FetchError::InvalidResponse("<html>".to_string()).is_transient());
        assert!(!FetchError::ShuttingDown.is_transient());
    }

    #[test]
    fn upstream_message_includes_status_when_known() {
        let with_status = FetchError::Upstream {
            status: Some(502),
            message: "bad gateway".to_string(),
        };
        assert_eq!(with_status.to_string(), "Upstream error (HTTP 502): bad gateway");
        assert_eq!(
            FetchError::upstream("refused").to_string(),
            "Upstream error: refused"
        );
    }

    #[test]
    fn rate_limited_message_shows_seconds() {
        let err = FetchError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "Rate limited upstream, retry after 60s");
    }
}
