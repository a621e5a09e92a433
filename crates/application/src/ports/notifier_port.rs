//! Notifier port
//!
//! Outbound alert delivery. How a message reaches people is up to the adapter.

use async_trait::async_trait;
use domain::AlertEvent;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Alert delivery failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The channel could not be reached
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),

    /// The channel refused the message
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Port for alert delivery
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotifierPort: Send + Sync {
    /// Deliver one alert
    async fn send(&self, alert: &AlertEvent) -> Result<(), DeliveryError>;
}
