//! Document repository abstraction.

use crate::error::DomainError;

/// Repository trait for loading and replacing the whole persisted document.
///
/// The document travels as raw JSON so that the caller can migrate older
/// shapes before deserializing into typed structures.
pub trait DocumentRepository {
    /// Load the raw document.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the backing storage exists but
    /// cannot be read or does not contain valid JSON.
    fn load_document(&self) -> Result<Option<serde_json::Value>, DomainError>;

    /// Replace the persisted document with `document`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the document cannot be written.
    fn save_document(&self, document: &serde_json::Value) -> Result<(), DomainError>;
}
