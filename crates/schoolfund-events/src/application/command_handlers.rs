//! Command handlers for the event participation context.
//!
//! Every handler validates first, then mutates the document, then hands the
//! affected event to `commit`, which recomputes its prices and persists.
//! A rejected command leaves the document untouched.

use schoolfund_core::error::DomainError;
use schoolfund_core::repository::DocumentRepository;

use crate::application::store::EventRecordStore;
use crate::domain::commands::{EventPatch, NewEvent, validate_amount};
use crate::domain::ids::{EventId, StudentId};
use crate::domain::money::Money;

impl<R: DocumentRepository> EventRecordStore<R> {
    /// Creates an event and persists the document.
    ///
    /// Returns the id of the new event, derived from its name when the
    /// caller did not supply one.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for invalid data,
    /// `DomainError::DuplicateId` if the id is taken, or
    /// `DomainError::Persistence` if the save fails.
    pub fn create_event(&mut self, data: NewEvent) -> Result<EventId, DomainError> {
        let event = data.into_event()?;
        let event_id = event.id.clone();
        self.document_mut().insert_event(event)?;
        tracing::info!(event_id = %event_id, "created event");
        self.commit(&event_id)?;
        Ok(event_id)
    }

    /// Applies an allow-listed partial update to an event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist,
    /// `DomainError::Validation` for invalid values, or
    /// `DomainError::Persistence` if the save fails.
    pub fn update_event(
        &mut self,
        event_id: impl Into<EventId>,
        patch: EventPatch,
    ) -> Result<(), DomainError> {
        let event_id = event_id.into();
        if !self.document().contains_event(&event_id) {
            return Err(DomainError::NotFound(format!("event {event_id}")));
        }
        patch.validate()?;

        let event = self.document_mut().event_mut(&event_id)?;
        patch.apply_to(event);
        tracing::info!(event_id = %event_id, "updated event");
        self.commit(&event_id)
    }

    /// Enrols a student in an event. Assigning an existing pair changes
    /// nothing but still recomputes and saves.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist, or
    /// `DomainError::Persistence` if the save fails.
    pub fn assign(
        &mut self,
        student_id: impl Into<StudentId>,
        event_id: impl Into<EventId>,
    ) -> Result<(), DomainError> {
        let student_id = student_id.into();
        let event_id = event_id.into();
        let changed = self.document_mut().enroll(&student_id, &event_id)?;
        tracing::info!(student_id = %student_id, event_id = %event_id, changed, "assigned student");
        self.commit(&event_id)
    }

    /// Enrols several students in one event with a single save.
    ///
    /// Returns how many students were newly enrolled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist, or
    /// `DomainError::Persistence` if the save fails.
    pub fn assign_many<I, S>(
        &mut self,
        student_ids: I,
        event_id: impl Into<EventId>,
    ) -> Result<usize, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<StudentId>,
    {
        let event_id = event_id.into();
        if !self.document().contains_event(&event_id) {
            return Err(DomainError::NotFound(format!("event {event_id}")));
        }
        self.batch(|store| {
            let mut added = 0;
            for student_id in student_ids {
                let student_id = student_id.into();
                if store.document_mut().enroll(&student_id, &event_id)? {
                    added += 1;
                }
            }
            tracing::info!(event_id = %event_id, added, "assigned students in bulk");
            store.commit(&event_id)?;
            Ok(added)
        })
    }

    /// Withdraws a student from an event. Removing a pair that does not
    /// exist is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if the save fails.
    pub fn remove(
        &mut self,
        student_id: impl Into<StudentId>,
        event_id: impl Into<EventId>,
    ) -> Result<(), DomainError> {
        let student_id = student_id.into();
        let event_id = event_id.into();
        let changed = self.document_mut().withdraw(&student_id, &event_id);
        tracing::info!(student_id = %student_id, event_id = %event_id, changed, "removed student");
        self.commit(&event_id)
    }

    /// Enables or disables pooled sales for an event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist, or
    /// `DomainError::Persistence` if the save fails.
    pub fn toggle_sales(
        &mut self,
        event_id: impl Into<EventId>,
        enabled: bool,
    ) -> Result<(), DomainError> {
        let event_id = event_id.into();
        self.document_mut().event_mut(&event_id)?.sales_enabled = enabled;
        tracing::info!(event_id = %event_id, enabled, "toggled pooled sales");
        self.commit(&event_id)
    }

    /// Sets the pooled sales total for an event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist,
    /// `DomainError::Validation` for a negative amount, or
    /// `DomainError::Persistence` if the save fails.
    pub fn update_sales_total(
        &mut self,
        event_id: impl Into<EventId>,
        amount: Money,
    ) -> Result<(), DomainError> {
        let event_id = event_id.into();
        if !self.document().contains_event(&event_id) {
            return Err(DomainError::NotFound(format!("event {event_id}")));
        }
        validate_amount("total sales", amount)?;
        self.document_mut().event_mut(&event_id)?.total_sales = amount;
        tracing::info!(event_id = %event_id, amount = %amount, "updated pooled sales total");
        self.commit(&event_id)
    }
}
