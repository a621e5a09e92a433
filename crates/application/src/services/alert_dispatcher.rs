//! Alert dispatch
//!
//! Hands a raised alert to the store and then to the notifier. The two are
//! independent: a delivery failure never rolls back the stored record, and a
//! store failure does not suppress delivery.

use std::sync::Arc;

use domain::AlertEvent;
use tracing::{error, info, instrument, warn};

use crate::ports::{NotifierPort, StorePort};

/// What happened to one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub persisted: bool,
    pub delivered: bool,
}

/// Boundary between alert detection and the outside world
#[derive(Clone)]
pub struct AlertDispatcher {
    store: Arc<dyn StorePort>,
    notifier: Arc<dyn NotifierPort>,
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher").finish_non_exhaustive()
    }
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn StorePort>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self { store, notifier }
    }

    /// Persist and deliver an alert
    #[instrument(skip(self, alert), fields(city = %alert.city, alert_type = %alert.alert_type, alert_id = %alert.id))]
    pub async fn dispatch(&self, alert: &AlertEvent) -> DispatchOutcome {
        let persisted = match self.store.save_alert(alert).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist alert");
                false
            },
        };

        let delivered = match self.notifier.send(alert).await {
            Ok(()) => {
                info!("Alert delivered");
                true
            },
            Err(e) => {
                error!(error = %e, "Alert delivery failed");
                false
            },
        };

        DispatchOutcome {
            persisted,
            delivered,
        }
    }
}
