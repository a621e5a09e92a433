//! Caching layer
//!
//! In-memory cache of the latest reading per city, consulted by the fetch
//! client before it goes upstream.

mod reading_cache;

pub use reading_cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_TTL, ReadingCache};
