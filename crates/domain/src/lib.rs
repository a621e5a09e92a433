//! Domain layer for Weather Watch
//!
//! Contains the observation and alert entities, the value objects they are
//! built from, and the pure condition-scoring algorithm. This layer performs
//! no I/O and reads no clock.

pub mod entities;
pub mod errors;
pub mod scoring;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use scoring::{ConditionScorer, ScoreResult, SeverityTable};
pub use value_objects::*;
