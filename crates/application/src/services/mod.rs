//! Application services - Use case implementations

mod alert_detector;
mod alert_dispatcher;
mod ingestion_service;
mod scheduler;
mod summary_service;

pub use alert_detector::{AlertDetector, AlertSettings, StreakPhase, StreakState};
pub use alert_dispatcher::{AlertDispatcher, DispatchOutcome};
pub use ingestion_service::{
    CityFailure, CycleReport, DEFAULT_FETCH_TIMEOUT, IngestionConfig, IngestionService,
};
pub use scheduler::{IngestionScheduler, SchedulerConfig};
pub use summary_service::SummaryService;
