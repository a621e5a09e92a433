//! Summary queries over stored readings
//!
//! Daily summaries and multi-day trends for one city. These are computed on
//! demand from the store's window query and are not part of the ingestion
//! hot path.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use domain::{
    CityName, ConditionScorer, DailySummary, MetricStats, Reading, ScoreResult, TemperatureTrend,
    TrendDirection, WeatherTrends,
};
use tracing::{debug, instrument};

use crate::{error::ApplicationError, ports::StorePort};

/// Read-side service for city summaries
pub struct SummaryService {
    store: Arc<dyn StorePort>,
    scorer: ConditionScorer,
}

impl std::fmt::Debug for SummaryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryService")
            .field("scorer", &self.scorer)
            .finish_non_exhaustive()
    }
}

impl SummaryService {
    pub fn new(store: Arc<dyn StorePort>, scorer: ConditionScorer) -> Self {
        Self { store, scorer }
    }

    /// Dominant condition over the `window` ending at `now`
    #[instrument(skip(self), fields(city = %city))]
    pub async fn dominant_condition(
        &self,
        city: &CityName,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<ScoreResult, ApplicationError> {
        let readings = self.store.readings_between(city, now - window, now).await?;
        Ok(self.scorer.score(&readings, now))
    }

    /// Summary of one UTC calendar day, or `None` if nothing was recorded
    #[instrument(skip(self), fields(city = %city))]
    pub async fn daily_summary(
        &self,
        city: &CityName,
        date: NaiveDate,
        evaluated_at: DateTime<Utc>,
    ) -> Result<Option<DailySummary>, ApplicationError> {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        let readings = self.store.readings_between(city, start, end).await?;

        let Some(stats) = WindowStats::of(&readings) else {
            debug!(%date, "No readings for day");
            return Ok(None);
        };

        Ok(Some(DailySummary {
            city: city.clone(),
            date,
            reading_count: readings.len(),
            temperature: stats.temperature,
            humidity: stats.humidity,
            wind_speed: stats.wind_speed,
            analysis: self.scorer.score(&readings, evaluated_at),
        }))
    }

    /// Trends over the last `days` days, or `None` if nothing was recorded
    #[instrument(skip(self), fields(city = %city))]
    pub async fn weather_trends(
        &self,
        city: &CityName,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherTrends>, ApplicationError> {
        if days == 0 {
            return Err(ApplicationError::Domain(domain::DomainError::ValidationError(
                "trend window must cover at least one day".to_string(),
            )));
        }

        let from = now - Duration::days(i64::from(days));
        let mut readings = self.store.readings_between(city, from, now).await?;
        readings.sort_by_key(|r| r.observed_at);

        let (Some(stats), Some(first), Some(last)) =
            (WindowStats::of(&readings), readings.first(), readings.last())
        else {
            return Ok(None);
        };

        let mut distribution = BTreeMap::new();
        for reading in &readings {
            *distribution
                .entry(reading.condition.to_string())
                .or_insert(0) += 1;
        }

        Ok(Some(WeatherTrends {
            city: city.clone(),
            from,
            to: now,
            reading_count: readings.len(),
            temperature: TemperatureTrend {
                stats: stats.temperature,
                direction: TrendDirection::between(first.temperature_c, last.temperature_c),
            },
            humidity: stats.humidity,
            wind_speed: stats.wind_speed,
            condition_distribution: distribution,
        }))
    }
}

struct WindowStats {
    temperature: MetricStats,
    humidity: MetricStats,
    wind_speed: MetricStats,
}

impl WindowStats {
    fn of(readings: &[Reading]) -> Option<Self> {
        Some(Self {
            temperature: MetricStats::from_values(readings.iter().map(|r| r.temperature_c))?,
            humidity: MetricStats::from_values(readings.iter().map(|r| r.humidity_pct))?,
            wind_speed: MetricStats::from_values(readings.iter().map(|r| r.wind_speed))?,
        })
    }
}
