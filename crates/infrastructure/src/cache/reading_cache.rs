//! Moka-backed cache of recent readings
//!
//! Entries live for a fixed TTL counted from insertion. The cache is bounded
//! by entry count and evicts the least recently used city when full.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use domain::{CityName, Reading};
use moka::{future::Cache, policy::EvictionPolicy};
use serde::Serialize;
use tracing::{debug, instrument};

/// Default time-to-live for a cached reading (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached cities
pub const DEFAULT_CAPACITY: u64 = 100;

/// Hit and miss counters of a [`ReadingCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    /// Share of lookups served from the cache, 0.0 when nothing was looked up
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-city reading cache
pub struct ReadingCache {
    cache: Cache<String, Reading>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ReadingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.cache.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for ReadingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl ReadingCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            cache,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh reading for `city`
    #[instrument(skip(self), fields(city = %city), level = "debug")]
    pub async fn get(&self, city: &CityName) -> Option<Reading> {
        let hit = self.cache.get(&city.key()).await;
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss");
        }
        hit
    }

    /// Store a reading under its city, replacing any previous entry
    pub async fn insert(&self, reading: Reading) {
        let key = reading.city.key();
        self.cache.insert(key, reading).await;
    }

    pub async fn invalidate(&self, city: &CityName) {
        self.cache.invalidate(&city.key()).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }

    /// Flush moka's pending maintenance so counts and evictions are current
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain::WeatherCondition;

    use super::*;

    fn reading(city: &str, temp: f64) -> Reading {
        Reading {
            city: CityName::new(city).unwrap(),
            condition: WeatherCondition::Clear,
            temperature_c: temp,
            feels_like_c: temp,
            humidity_pct: 40.0,
            wind_speed: 2.0,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ReadingCache::default();
        let delhi = CityName::new("Delhi").unwrap();

        assert!(cache.get(&delhi).await.is_none());
        cache.insert(reading("Delhi", 31.0)).await;
        let cached = cache.get(&delhi).await.unwrap();

        assert!((cached.temperature_c - 31.0).abs() < f64::EPSILON);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn keys_ignore_case() {
        let cache = ReadingCache::default();
        cache.insert(reading("Mumbai", 29.0)).await;

        let lookup = CityName::new("  MUMBAI ").unwrap();
        assert!(cache.get(&lookup).await.is_some());
    }

    #[tokio::test]
    async fn insert_replaces_previous_reading() {
        let cache = ReadingCache::default();
        cache.insert(reading("Chennai", 30.0)).await;
        cache.insert(reading("Chennai", 33.0)).await;

        let cached = cache.get(&CityName::new("Chennai").unwrap()).await.unwrap();
        assert!((cached.temperature_c - 33.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ReadingCache::new(Duration::from_millis(50), 10);
        let kolkata = CityName::new("Kolkata").unwrap();
        cache.insert(reading("Kolkata", 30.0)).await;
        assert!(cache.get(&kolkata).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(&kolkata).await.is_none());
    }

    #[tokio::test]
    async fn capacity_bounds_entry_count() {
        let cache = ReadingCache::new(DEFAULT_TTL, 2);
        for city in ["Delhi", "Mumbai", "Chennai", "Bangalore"] {
            cache.insert(reading(city, 30.0)).await;
            cache.sync().await;
        }

        assert!(cache.stats().entries <= 2);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = ReadingCache::default();
        let city = CityName::new("Hyderabad").unwrap();
        cache.insert(reading("Hyderabad", 30.0)).await;
        cache.invalidate(&city).await;

        assert!(cache.get(&city).await.is_none());
    }
}
