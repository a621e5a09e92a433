//! Log notifier - Implements NotifierPort by writing alerts to the log
//!
//! The default delivery channel when no external notifier is configured.
//! Each alert becomes one structured `warn` event carrying the rendered
//! message.

use std::sync::atomic::{AtomicU64, Ordering};

use application::ports::{DeliveryError, NotifierPort};
use async_trait::async_trait;
use domain::AlertEvent;
use tracing::warn;

/// Notifier that emits alerts as tracing events
#[derive(Debug, Default)]
pub struct LogNotifier {
    delivered: AtomicU64,
}

impl LogNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts emitted so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn send(&self, alert: &AlertEvent) -> Result<(), DeliveryError> {
        warn!(
            alert_id = %alert.id,
            city = %alert.city,
            alert_type = %alert.alert_type,
            threshold = alert.threshold_value,
            actual = alert.actual_value,
            raised_at = %alert.raised_at,
            "{}",
            alert.message()
        );
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
