//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod notifier_port;
mod store_port;
mod weather_port;

#[cfg(test)]
pub use notifier_port::MockNotifierPort;
pub use notifier_port::{DeliveryError, NotifierPort};
#[cfg(test)]
pub use store_port::MockStorePort;
pub use store_port::StorePort;
#[cfg(test)]
pub use weather_port::MockWeatherPort;
pub use weather_port::{FetchError, WeatherPort};
