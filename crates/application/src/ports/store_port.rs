//! Store port
//!
//! The persistence collaborator. The pipeline only needs the active city
//! list, append-only writes, and a time-window query for summaries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{AlertEvent, CityName, Reading};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for reading and alert persistence
///
/// Implementations must be safe to call concurrently; the scheduler writes
/// readings for many cities at once.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorePort: Send + Sync {
    /// Cities to poll, in the order they should be processed
    async fn list_active_cities(&self) -> Result<Vec<CityName>, ApplicationError>;

    /// Persist a reading
    async fn save_reading(&self, reading: &Reading) -> Result<(), ApplicationError>;

    /// Persist a raised alert
    async fn save_alert(&self, alert: &AlertEvent) -> Result<(), ApplicationError>;

    /// Readings for a city with `start <= observed_at < end`, oldest first
    async fn readings_between(
        &self,
        city: &CityName,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, ApplicationError>;
}
