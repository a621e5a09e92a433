//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// City identifier was empty or malformed
    #[error("Invalid city: {0}")]
    InvalidCity(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}
