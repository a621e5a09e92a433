//! Application-level errors

use domain::DomainError;
use thiserror::Error;

use crate::ports::FetchError;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Weather lookup failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Store collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_keep_their_message() {
        let err = ApplicationError::from(FetchError::NotFound("Atlantis".to_string()));
        assert_eq!(err.to_string(), "City not found upstream: Atlantis");
    }

    #[test]
    fn storage_error_message() {
        let err = ApplicationError::Storage("locked".to_string());
        assert_eq!(err.to_string(), "Storage error: locked");
    }
}
