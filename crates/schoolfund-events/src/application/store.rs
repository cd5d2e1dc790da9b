//! The event record store: owner of the in-memory document.
//!
//! The store is created once at startup and handed to every collaborator
//! that needs it. Every mutation recomputes the affected event's prices and
//! writes the whole document back through the repository, unless it runs
//! inside [`EventRecordStore::batch`].

use schoolfund_core::error::DomainError;
use schoolfund_core::repository::DocumentRepository;

use crate::domain::aggregates::Document;
use crate::domain::ids::EventId;
use crate::domain::migration::migrate;
use crate::domain::seed::seed_document;

/// Owns the document and its repository.
#[derive(Debug)]
pub struct EventRecordStore<R: DocumentRepository> {
    document: Document,
    repository: R,
    batch_depth: usize,
    pending_save: bool,
}

impl<R: DocumentRepository> EventRecordStore<R> {
    /// Opens the store, loading the document from `repository`.
    ///
    /// Never fails: a missing, unreadable or malformed document is replaced
    /// by the seed data, with a warning logged for the latter two.
    #[must_use]
    pub fn open(repository: R) -> Self {
        let document = load(&repository);
        Self {
            document,
            repository,
            batch_depth: 0,
            pending_save: false,
        }
    }

    /// Read access to the whole document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The backing repository.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns `true` while inside a [`EventRecordStore::batch`] scope.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Writes the whole document through the repository.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if serialization or the write fails.
    pub fn save(&self) -> Result<(), DomainError> {
        let value = serde_json::to_value(&self.document).map_err(|e| {
            DomainError::Persistence(format!("document serialization failed: {e}"))
        })?;
        self.repository.save_document(&value)
    }

    /// Runs several mutations with a single save at the end.
    ///
    /// Each mutation inside `f` still leaves the in-memory document
    /// consistent. Nested batches save once, when the outermost one ends. If
    /// `f` fails after some mutations succeeded, those are still saved and
    /// `f`'s error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or `DomainError::Persistence` if the final
    /// save fails.
    pub fn batch<T, F>(&mut self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut Self) -> Result<T, DomainError>,
    {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;

        if self.batch_depth > 0 || !self.pending_save {
            return result;
        }

        match (result, self.flush()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(save_error)) => Err(save_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(save_error)) => {
                tracing::error!(
                    error = %save_error,
                    "failed to save changes made before the batch was aborted"
                );
                Err(error)
            }
        }
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Recomputes `event_id`'s prices and persists, or defers persisting
    /// while batching.
    pub(crate) fn commit(&mut self, event_id: &EventId) -> Result<(), DomainError> {
        self.document.reallocate(event_id);
        self.pending_save = true;
        if self.is_batching() {
            return Ok(());
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<(), DomainError> {
        self.save()?;
        self.pending_save = false;
        Ok(())
    }
}

fn load(repository: &dyn DocumentRepository) -> Document {
    let raw = match repository.load_document() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!("no event document found, starting from seed data");
            return seed_document();
        }
        Err(e) => {
            tracing::warn!(error = %e, "event document unreadable, starting from seed data");
            return seed_document();
        }
    };

    match serde_json::from_value::<Document>(migrate(raw)) {
        Ok(mut document) => {
            document.reallocate_all();
            tracing::info!(
                events = document.event_count(),
                students = document.student_index().count(),
                "loaded event document"
            );
            document
        }
        Err(e) => {
            tracing::warn!(error = %e, "event document malformed, starting from seed data");
            seed_document()
        }
    }
}

#[cfg(test)]
mod tests {
    use schoolfund_core::error::DomainError;
    use schoolfund_test_support::{
        FailingDocumentRepository, InMemoryDocumentRepository, ReadOnlyDocumentRepository,
        init_tracing,
    };
    use serde_json::json;

    use super::EventRecordStore;
    use crate::domain::ids::{EventId, StudentId};
    use crate::domain::money::Money;

    #[test]
    fn test_open_without_document_uses_seed_and_does_not_save() {
        // Arrange
        init_tracing();
        let repo = InMemoryDocumentRepository::new();

        // Act
        let store = EventRecordStore::open(repo);

        // Assert
        assert_eq!(store.document().event_count(), 3);
        assert_eq!(store.repository().save_count(), 0);
    }

    #[test]
    fn test_open_with_unreadable_document_falls_back_to_seed() {
        init_tracing();

        let store = EventRecordStore::open(FailingDocumentRepository);

        assert_eq!(store.document().event_count(), 3);
    }

    #[test]
    fn test_open_zeroes_an_unrepresentable_amount_and_keeps_the_rest() {
        // Arrange
        init_tracing();
        let repo = InMemoryDocumentRepository::with_document(json!({
            "events": {
                "x": { "nom": "X", "cout_total": 1e300, "participants": { "1": {} } },
                "y": { "nom": "Y", "cout_total": 80 }
            },
            "student_events": { "2": ["y"] }
        }));

        // Act
        let store = EventRecordStore::open(repo);

        // Assert
        let document = store.document();
        assert_eq!(document.event_count(), 2);
        assert_eq!(
            document.event(&EventId::from("x")).unwrap().total_cost,
            Money::ZERO
        );
        assert_eq!(
            store.participants_for_event(&"y".into())[&StudentId::from(2)].final_price,
            Money::from_cents(8_000)
        );
    }

    #[test]
    fn test_open_replaces_non_numeric_amounts_with_zero() {
        let repo = InMemoryDocumentRepository::with_document(json!({
            "events": { "x": { "nom": "X", "cout_total": { "amount": 3 } } }
        }));

        let store = EventRecordStore::open(repo);

        let event = store.document().event(&EventId::from("x")).unwrap();
        assert_eq!(event.total_cost, Money::ZERO);
    }

    #[test]
    fn test_open_migrates_legacy_document_and_recomputes_prices() {
        // Arrange
        init_tracing();
        let repo = InMemoryDocumentRepository::with_document(json!({
            "events": {
                "voyage": {
                    "id": "voyage",
                    "nom": "Voyage",
                    "date": "2025-05-02",
                    "cout_total": 300,
                    "participants": {
                        "1": { "prix_base": 0, "prix_final": 0, "vente": 20 },
                        "2": { "prix_base": 150 }
                    }
                }
            },
            "student_events": { "1": ["voyage"] }
        }));

        // Act
        let store = EventRecordStore::open(repo);

        // Assert
        let document = store.document();
        assert!(document.index_is_symmetric());
        let event = document.event(&EventId::from("voyage")).unwrap();
        assert!(!event.sales_enabled);
        assert_eq!(event.total_sales, Money::ZERO);
        for participation in event.participants.values() {
            assert_eq!(participation.base_price, Money::from_cents(15_000));
            assert_eq!(participation.final_price, Money::from_cents(15_000));
        }
        assert_eq!(
            document.events_for_student(&StudentId::from(2)),
            &[EventId::from("voyage")]
        );
    }

    #[test]
    fn test_save_propagates_persistence_error() {
        let store = EventRecordStore::open(ReadOnlyDocumentRepository::new(None));

        match store.save().unwrap_err() {
            DomainError::Persistence(msg) => assert!(msg.contains("permission denied")),
            other => panic!("expected Persistence, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_saves_once_for_many_mutations() {
        // Arrange
        let mut store = EventRecordStore::open(InMemoryDocumentRepository::new());

        // Act
        store
            .batch(|store| {
                for student in 1..=5_u32 {
                    store.assign(student, "concert")?;
                }
                Ok(())
            })
            .unwrap();

        // Assert
        assert_eq!(store.repository().save_count(), 1);
        let saved = store.repository().last_saved().unwrap();
        assert_eq!(
            saved["events"]["concert"]["participants"]
                .as_object()
                .unwrap()
                .len(),
            5
        );
        assert_eq!(saved["events"]["concert"]["participants"]["3"]["prix_final"], json!(60.0));
    }

    #[test]
    fn test_nested_batches_save_once_at_outermost_level() {
        let mut store = EventRecordStore::open(InMemoryDocumentRepository::new());

        store
            .batch(|outer| {
                outer.assign(1, "concert")?;
                outer.batch(|inner| inner.assign(2, "concert"))?;
                assert_eq!(outer.repository().save_count(), 0);
                Ok(())
            })
            .unwrap();

        assert_eq!(store.repository().save_count(), 1);
        assert!(!store.is_batching());
    }

    #[test]
    fn test_batch_keeps_in_memory_prices_current_before_save() {
        let mut store = EventRecordStore::open(InMemoryDocumentRepository::new());

        store
            .batch(|store| {
                store.assign(1, "concert")?;
                store.assign(2, "concert")?;
                let prices = store.participants_for_event(&"concert".into());
                assert!(
                    prices
                        .values()
                        .all(|p| p.final_price == Money::from_cents(15_000))
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_aborted_batch_saves_completed_mutations_and_returns_error() {
        // Arrange
        let mut store = EventRecordStore::open(InMemoryDocumentRepository::new());

        // Act
        let result = store.batch(|store| {
            store.assign(1, "concert")?;
            store.assign(2, "ghost")
        });

        // Assert
        match result.unwrap_err() {
            DomainError::NotFound(msg) => assert!(msg.contains("ghost")),
            other => panic!("expected NotFound, got {other:?}"),
        }
        let saved = store.repository().saved_documents();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["student_events"]["1"], json!(["concert"]));
        assert_eq!(
            store.events_for_student(&StudentId::from(1)),
            vec![EventId::from("concert")]
        );
    }

    #[test]
    fn test_batch_without_mutations_does_not_save() {
        let mut store = EventRecordStore::open(InMemoryDocumentRepository::new());

        let count = store.batch(|store| Ok(store.get_events().len())).unwrap();

        assert_eq!(count, 3);
        assert_eq!(store.repository().save_count(), 0);
    }
}
