//! Pipeline wiring and lifecycle
//!
//! Builds the adapters from an [`AppConfig`], runs the scheduler until a
//! shutdown signal arrives and keeps hot-reloadable settings in sync.

use std::sync::Arc;

use application::{
    AlertDetector, AlertDispatcher, ApplicationError, FetchError, IngestionScheduler,
    IngestionService, SummaryService, ports::{StorePort, WeatherPort},
};
use chrono::Utc;
use domain::{CityName, DomainError, Reading};
use infrastructure::{AppConfig, ConfigError, FetchClient, InMemoryStore, LogNotifier};
use integration_weather::{OpenWeatherMapClient, WeatherApiError};
use thiserror::Error;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config_reload::{ReloadableConfig, spawn_config_reload_handler};

/// Errors surfaced by the binary's commands
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to create weather client: {0}")]
    Client(#[from] WeatherApiError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("Scheduler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Every long-lived component of a running pipeline
#[derive(Debug)]
pub struct Pipeline {
    pub fetch: Arc<FetchClient>,
    pub store: Arc<InMemoryStore>,
    pub detector: Arc<AlertDetector>,
    pub ingestion: Arc<IngestionService>,
    pub summaries: SummaryService,
}

impl Pipeline {
    /// Wire the adapters and services described by `config`
    pub fn build(config: &AppConfig) -> Result<Self, AppError> {
        let fetch = Arc::new(build_fetch_client(config)?);
        let store = Arc::new(InMemoryStore::new(config.active_cities()?));
        let detector = Arc::new(AlertDetector::new(config.alert_settings()));
        let dispatcher = AlertDispatcher::new(store.clone(), Arc::new(LogNotifier::new()));

        let ingestion = Arc::new(IngestionService::new(
            fetch.clone(),
            store.clone(),
            detector.clone(),
            dispatcher,
            config.scheduler.ingestion_config(),
        ));
        let summaries = SummaryService::new(store.clone(), config.scoring.scorer());

        Ok(Self {
            fetch,
            store,
            detector,
            ingestion,
            summaries,
        })
    }

    /// Push reloadable settings into the running components
    ///
    /// Alert thresholds and the city list take effect on the next cycle.
    /// Fetch, retry and scheduler settings need a restart.
    pub fn apply_settings(&self, config: &AppConfig) -> Result<(), AppError> {
        let cities = config.active_cities()?;
        let settings = config.alert_settings();
        settings.validate()?;
        info!(
            temperature_threshold = settings.temperature_threshold,
            consecutive_required = settings.consecutive_required,
            cities = cities.len(),
            "Applying reloaded settings"
        );
        self.detector.update_settings(settings);
        self.store.set_cities(cities);
        Ok(())
    }

    /// Log today's summary for every active city
    pub async fn log_daily_summaries(&self) -> Result<(), AppError> {
        let now = Utc::now();
        for city in self.store.list_active_cities().await? {
            match self.summaries.daily_summary(&city, now.date_naive(), now).await? {
                Some(summary) => info!(
                    city = %city,
                    readings = summary.reading_count,
                    avg_temperature = summary.temperature.avg,
                    max_temperature = summary.temperature.max,
                    dominant = ?summary.analysis.dominant_condition.as_ref().map(ToString::to_string),
                    confidence_pct = summary.analysis.confidence_pct,
                    "Daily summary"
                ),
                None => info!(city = %city, "No readings today"),
            }
        }
        Ok(())
    }
}

fn build_fetch_client(config: &AppConfig) -> Result<FetchClient, AppError> {
    let upstream = OpenWeatherMapClient::new(config.weather.clone())?;
    Ok(FetchClient::new(
        Arc::new(upstream),
        config.fetch_client_config(),
    ))
}

/// Run the pipeline until Ctrl+C or SIGTERM
pub async fn run(config: ReloadableConfig) -> Result<(), AppError> {
    let current = config.load();
    current.require_api_key()?;

    let pipeline = Arc::new(Pipeline::build(&current)?);
    let shutdown = CancellationToken::new();

    spawn_config_reload_handler(config.clone(), shutdown.clone());
    let watcher = spawn_settings_watcher(config, Arc::clone(&pipeline), shutdown.clone());
    let scheduler = IngestionScheduler::new(
        Arc::clone(&pipeline.ingestion),
        current.scheduler.scheduler_config(),
    )
    .spawn(shutdown.clone());

    info!(
        cities = current.cities.len(),
        poll_interval_secs = current.scheduler.poll_interval_secs,
        "Weather watch started"
    );

    shutdown_signal().await;
    shutdown.cancel();
    pipeline.fetch.shutdown();

    let cycles = scheduler.await?;
    if let Err(e) = watcher.await {
        warn!(error = %e, "Settings watcher ended abnormally");
    }
    if let Err(e) = pipeline.log_daily_summaries().await {
        warn!(error = %e, "Failed to build daily summaries");
    }

    info!(cycles, stats = ?pipeline.fetch.stats(), "Weather watch stopped");
    Ok(())
}

/// Fetch one city through the full client policy
pub async fn fetch_once(config: &AppConfig, city: &str) -> Result<Reading, AppError> {
    config.require_api_key()?;
    let city = CityName::new(city)?;
    let client = build_fetch_client(config)?;
    Ok(client.fetch(&city).await?)
}

/// Apply every configuration change until `shutdown` fires
pub fn spawn_settings_watcher(
    config: ReloadableConfig,
    pipeline: Arc<Pipeline>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let mut changes = config.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                () = shutdown.cancelled() => break,
            }

            if let Err(e) = pipeline.apply_settings(&config.load()) {
                warn!(error = %e, "Reloaded settings rejected");
            }
        }
    })
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use infrastructure::ConfigSource;
    use integration_weather::OpenWeatherConfig;

    use super::*;

    fn config_with_key() -> AppConfig {
        AppConfig {
            weather: OpenWeatherConfig::with_api_key("test-key"),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn build_seeds_store_with_configured_cities() {
        let pipeline = Pipeline::build(&config_with_key()).unwrap();

        let cities = pipeline.store.list_active_cities().await.unwrap();
        assert_eq!(cities.len(), 6);
        assert!((pipeline.detector.settings().temperature_threshold - 35.0).abs() < f64::EPSILON);
        assert_eq!(pipeline.fetch.stats().max_concurrent_requests, 10);
    }

    #[tokio::test]
    async fn fetch_once_requires_api_key() {
        let result = fetch_once(&AppConfig::default(), "Delhi").await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn fetch_once_rejects_blank_city() {
        let result = fetch_once(&config_with_key(), "   ").await;
        assert!(matches!(result, Err(AppError::Domain(_))));
    }

    #[tokio::test]
    async fn watcher_applies_reloaded_settings() {
        let config = ReloadableConfig::new(config_with_key(), ConfigSource::default());
        let pipeline = Arc::new(Pipeline::build(&config.load()).unwrap());
        let shutdown = CancellationToken::new();
        let watcher = spawn_settings_watcher(config.clone(), Arc::clone(&pipeline), shutdown.clone());

        let mut updated = config_with_key();
        updated.alerts.temperature_threshold = 40.0;
        updated.cities = vec!["Pune".to_string()];
        config.apply(updated);

        tokio::time::timeout(Duration::from_secs(5), async {
            while pipeline.detector.settings().temperature_threshold < 40.0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let cities = pipeline.store.list_active_cities().await.unwrap();
        assert_eq!(cities, vec![CityName::new("Pune").unwrap()]);

        shutdown.cancel();
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_cities_are_not_applied() {
        let pipeline = Pipeline::build(&config_with_key()).unwrap();
        let mut bad = config_with_key();
        bad.cities = vec![String::new()];

        assert!(pipeline.apply_settings(&bad).is_err());
        assert_eq!(pipeline.store.list_active_cities().await.unwrap().len(), 6);
    }
}
