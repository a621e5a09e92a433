//! Periodic ingestion scheduler
//!
//! Runs an ingestion cycle immediately and then again `poll_interval` after
//! each cycle finishes. Cycles never overlap. Each cycle runs in its own task
//! so a panic is contained and logged; the loop carries on with the next tick.
//!
//! Shutdown is cooperative through a [`CancellationToken`]. No new cycle
//! starts once it fires, and an in-flight cycle gets `shutdown_grace` to
//! finish before it is aborted.

use std::{sync::Arc, time::Duration};

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::ApplicationError,
    services::{CycleReport, IngestionService},
};

/// Timing for the scheduler loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Sleep between the end of one cycle and the start of the next
    pub poll_interval: Duration,
    /// Time an in-flight cycle gets to finish after shutdown is requested
    pub shutdown_grace: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Drives [`IngestionService`] on a fixed interval
#[derive(Debug)]
pub struct IngestionScheduler {
    service: Arc<IngestionService>,
    config: SchedulerConfig,
}

impl IngestionScheduler {
    pub fn new(service: Arc<IngestionService>, config: SchedulerConfig) -> Self {
        Self { service, config }
    }

    /// Run the loop on a background task
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run until `shutdown` is cancelled. Returns the number of cycles started.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Ingestion scheduler started"
        );
        let mut cycles = 0_u64;

        while !shutdown.is_cancelled() {
            cycles += 1;
            let service = Arc::clone(&self.service);
            let mut task = tokio::spawn(async move { service.run_cycle().await });

            tokio::select! {
                joined = &mut task => log_cycle(cycles, joined),
                () = shutdown.cancelled() => {
                    self.drain(cycles, task).await;
                    break;
                },
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval) => {},
                () = shutdown.cancelled() => break,
            }
        }

        info!(cycles, "Ingestion scheduler stopped");
        cycles
    }

    async fn drain(&self, cycle: u64, mut task: JoinHandle<Result<CycleReport, ApplicationError>>) {
        info!(
            cycle,
            grace_secs = self.config.shutdown_grace.as_secs(),
            "Shutdown requested, waiting for in-flight cycle"
        );
        match tokio::time::timeout(self.config.shutdown_grace, &mut task).await {
            Ok(joined) => log_cycle(cycle, joined),
            Err(_) => {
                warn!(cycle, "Cycle did not finish within grace period, aborting");
                task.abort();
            },
        }
    }
}

fn log_cycle(cycle: u64, joined: Result<Result<CycleReport, ApplicationError>, JoinError>) {
    match joined {
        Ok(Ok(report)) => {
            for failure in &report.failures {
                warn!(cycle, city = %failure.city, error = %failure.error, "City failed this cycle");
            }
        },
        Ok(Err(e)) => error!(cycle, error = %e, "Ingestion cycle failed"),
        Err(e) if e.is_panic() => error!(cycle, "Ingestion cycle panicked"),
        Err(e) => warn!(cycle, error = %e, "Ingestion cycle was cancelled"),
    }
}
