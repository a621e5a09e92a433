//! OpenWeatherMap integration
//!
//! Client for the OpenWeatherMap current-weather API
//! (<https://openweathermap.org/current>). One call is one HTTP request; retry,
//! caching and rate-limit handling are left to the caller.

pub mod client;
mod models;

pub use client::{
    DEFAULT_RETRY_AFTER_SECS, OpenWeatherConfig, OpenWeatherMapClient, WeatherApiError,
    WeatherClient,
};
pub use models::Observation;
