//! In-memory and failing `DocumentRepository` doubles for tests.

use std::sync::Mutex;

use schoolfund_core::error::DomainError;
use schoolfund_core::repository::DocumentRepository;

/// A repository that keeps the document in memory and records every save.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    stored: Mutex<Option<serde_json::Value>>,
    saved: Mutex<Vec<serde_json::Value>>,
}

impl InMemoryDocumentRepository {
    /// Create an empty repository; `load_document` returns `None`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose `load_document` returns `document`.
    #[must_use]
    pub fn with_document(document: serde_json::Value) -> Self {
        Self {
            stored: Mutex::new(Some(document)),
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every document that was saved, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved_documents(&self) -> Vec<serde_json::Value> {
        self.saved.lock().unwrap().clone()
    }

    /// Number of saves so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    /// The most recently saved document, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn last_saved(&self) -> Option<serde_json::Value> {
        self.saved.lock().unwrap().last().cloned()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn load_document(&self) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.stored.lock().unwrap().clone())
    }

    fn save_document(&self, document: &serde_json::Value) -> Result<(), DomainError> {
        *self.stored.lock().unwrap() = Some(document.clone());
        self.saved.lock().unwrap().push(document.clone());
        Ok(())
    }
}

/// A repository whose reads and writes always fail. Useful for testing the
/// seed fallback and save error paths.
#[derive(Debug)]
pub struct FailingDocumentRepository;

impl DocumentRepository for FailingDocumentRepository {
    fn load_document(&self) -> Result<Option<serde_json::Value>, DomainError> {
        Err(DomainError::Persistence("disk unreadable".into()))
    }

    fn save_document(&self, _document: &serde_json::Value) -> Result<(), DomainError> {
        Err(DomainError::Persistence("disk full".into()))
    }
}

/// A repository that returns the configured document but refuses to save.
#[derive(Debug)]
pub struct ReadOnlyDocumentRepository {
    document: Option<serde_json::Value>,
}

impl ReadOnlyDocumentRepository {
    /// Create a read-only repository returning `document` from every load.
    #[must_use]
    pub fn new(document: Option<serde_json::Value>) -> Self {
        Self { document }
    }
}

impl DocumentRepository for ReadOnlyDocumentRepository {
    fn load_document(&self) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.document.clone())
    }

    fn save_document(&self, _document: &serde_json::Value) -> Result<(), DomainError> {
        Err(DomainError::Persistence("permission denied".into()))
    }
}
