//! Repository-level error types.

use schoolfund_core::error::DomainError;
use thiserror::Error;

/// Failures raised while reading or writing the document file.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// File-system I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be encoded or decoded as JSON.
    #[error("JSON error on {path}: {source}")]
    Serialization {
        /// The path being accessed.
        path: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        DomainError::Persistence(err.to_string())
    }
}
