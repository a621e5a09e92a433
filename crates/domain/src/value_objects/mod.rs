//! Value Objects - Immutable, identity-less domain primitives

mod alert_id;
mod alert_type;
mod city_name;
mod weather_condition;

pub use alert_id::AlertId;
pub use alert_type::AlertType;
pub use city_name::CityName;
pub use weather_condition::WeatherCondition;
