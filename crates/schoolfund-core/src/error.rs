//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An event (or student pairing) was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An event with the same identifier already exists.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The document could not be written to its backing storage.
    #[error("persistence error: {0}")]
    Persistence(String),
}
