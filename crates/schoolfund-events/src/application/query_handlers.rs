//! Query handlers for the event participation context.
//!
//! Queries read the in-memory document and return owned copies or
//! serializable view DTOs; they never touch the repository.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use schoolfund_core::error::DomainError;
use schoolfund_core::repository::DocumentRepository;
use serde::Serialize;

use crate::application::store::EventRecordStore;
use crate::domain::aggregates::{Event, Participation};
use crate::domain::allocation;
use crate::domain::commands::parse_event_date;
use crate::domain::ids::{EventId, StudentId};
use crate::domain::money::Money;
use crate::domain::roster::StudentDirectory;

/// Cost breakdown of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCostSummary {
    /// The event identifier.
    pub event_id: EventId,
    /// Number of participants.
    pub participant_count: usize,
    /// The event's total cost.
    pub total_cost: Money,
    /// Pooled sales taken into account (zero while sales are disabled).
    pub sales_applied: Money,
    /// Per-head share of the cost.
    pub base_price: Money,
    /// Per-head share of the pooled sales.
    pub discount_per_head: Money,
    /// What each participant pays.
    pub final_price: Money,
    /// Sum of every participant's final price.
    pub amount_to_collect: Money,
}

/// A participant joined with their roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    /// Student identifier.
    pub id: StudentId,
    /// First name (empty if the student is not on the roster).
    pub name: String,
    /// Family name (empty if the student is not on the roster).
    pub surname: String,
    /// Class (empty if the student is not on the roster).
    pub class: String,
    /// Per-head share of the cost.
    pub base_price: Money,
    /// What the student pays.
    pub final_price: Money,
}

impl<R: DocumentRepository> EventRecordStore<R> {
    /// Returns every event, ordered by id.
    #[must_use]
    pub fn get_events(&self) -> Vec<Event> {
        self.document().events().cloned().collect()
    }

    /// Returns the event with `event_id`, if any.
    #[must_use]
    pub fn get_event(&self, event_id: &EventId) -> Option<Event> {
        self.document().event(event_id).cloned()
    }

    /// Returns the events `student_id` takes part in, in enrolment order.
    #[must_use]
    pub fn events_for_student(&self, student_id: &StudentId) -> Vec<EventId> {
        self.document().events_for_student(student_id).to_vec()
    }

    /// Returns the participants of `event_id` and their prices; empty for an
    /// unknown event.
    #[must_use]
    pub fn participants_for_event(&self, event_id: &EventId) -> BTreeMap<StudentId, Participation> {
        self.document()
            .event(event_id)
            .map(|event| event.participants.clone())
            .unwrap_or_default()
    }

    /// Returns every event sorted by date, then id. Events without a valid
    /// date come last.
    #[must_use]
    pub fn events_by_date(&self) -> Vec<Event> {
        let mut events = self.get_events();
        events.sort_by(|a, b| {
            let by_date = match (parse_event_date(&a.date), parse_event_date(&b.date)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_date.then_with(|| a.id.cmp(&b.id))
        });
        events
    }

    /// Summarises how an event's cost is split.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist.
    pub fn event_cost_summary(&self, event_id: &EventId) -> Result<EventCostSummary, DomainError> {
        let event = self
            .document()
            .event(event_id)
            .ok_or_else(|| DomainError::NotFound(format!("event {event_id}")))?;

        let participant_count = event.participants.len();
        let allocation = allocation::for_event(event);
        let (base_price, discount_per_head, final_price) = allocation
            .map(|a| (a.base_price, a.discount_per_head, a.final_price))
            .unwrap_or_default();
        let sales_applied = if event.sales_enabled {
            event.total_sales
        } else {
            Money::ZERO
        };

        Ok(EventCostSummary {
            event_id: event.id.clone(),
            participant_count,
            total_cost: event.total_cost,
            sales_applied,
            base_price,
            discount_per_head,
            final_price,
            amount_to_collect: final_price.times(participant_count),
        })
    }

    /// Sums the final prices `student_id` owes across all their events.
    #[must_use]
    pub fn student_total_due(&self, student_id: &StudentId) -> Money {
        let document = self.document();
        document
            .events_for_student(student_id)
            .iter()
            .filter_map(|event_id| document.event(event_id))
            .filter_map(|event| event.participants.get(student_id))
            .map(|participation| participation.final_price)
            .sum()
    }

    /// Lists an event's participants with their roster names, sorted by
    /// class, surname, then name. Empty for an unknown event.
    #[must_use]
    pub fn participant_roster(
        &self,
        event_id: &EventId,
        directory: &dyn StudentDirectory,
    ) -> Vec<ParticipantView> {
        let Some(event) = self.document().event(event_id) else {
            return Vec::new();
        };

        let mut views: Vec<ParticipantView> = event
            .participants
            .iter()
            .map(|(student_id, participation)| {
                let record = directory.find_student(student_id);
                let (name, surname, class) = record
                    .map(|r| (r.name, r.surname, r.class))
                    .unwrap_or_default();
                ParticipantView {
                    id: student_id.clone(),
                    name,
                    surname,
                    class,
                    base_price: participation.base_price,
                    final_price: participation.final_price,
                }
            })
            .collect();
        views.sort_by(|a, b| {
            (&a.class, &a.surname, &a.name, &a.id).cmp(&(&b.class, &b.surname, &b.name, &b.id))
        });
        views
    }
}
