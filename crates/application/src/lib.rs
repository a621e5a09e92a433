//! Application layer - Use cases and orchestration
//!
//! Contains the ingestion pipeline (scheduler, alert detection and dispatch),
//! the summary queries, and the port definitions adapters implement.

pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod test_support;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
