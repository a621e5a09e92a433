//! Domain entities - Objects with identity and lifecycle

mod alert_event;
mod reading;
mod summary;

pub use alert_event::AlertEvent;
pub use reading::Reading;
pub use summary::{DailySummary, MetricStats, TemperatureTrend, TrendDirection, WeatherTrends};
