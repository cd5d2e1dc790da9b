//! Aggregate roots for the event participation context.
//!
//! The `Document` is the unit of persistence: all events plus the inverse
//! student → events index. Its participation methods keep both sides of the
//! index in step; callers outside this crate only ever read it.

use std::collections::BTreeMap;

use schoolfund_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::allocation::{self, Allocation};
use super::ids::{EventId, StudentId};
use super::money::Money;

/// Derived prices for one student in one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    /// The student's share of the event's total cost.
    #[serde(rename = "prix_base", default)]
    pub base_price: Money,
    /// The share after the pooled sales discount, never negative.
    #[serde(rename = "prix_final", default)]
    pub final_price: Money,
}

/// A school activity students can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Date as entered, `YYYY-MM-DD` or `DD/MM/YYYY`, possibly empty.
    #[serde(default)]
    pub date: String,
    /// Total cost to share between participants.
    #[serde(rename = "cout_total", default)]
    pub total_cost: Money,
    /// Whether pooled sales reduce the participants' share.
    #[serde(rename = "ventes_activees", default)]
    pub sales_enabled: bool,
    /// Money raised collectively for the event.
    #[serde(rename = "total_ventes", default)]
    pub total_sales: Money,
    /// Participants and their derived prices.
    #[serde(default)]
    pub participants: BTreeMap<StudentId, Participation>,
    /// Optional free-text category.
    #[serde(rename = "categorie", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl Event {
    /// Creates an event with no cost, no sales and no participants.
    #[must_use]
    pub fn new(id: impl Into<EventId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date: String::new(),
            total_cost: Money::ZERO,
            sales_enabled: false,
            total_sales: Money::ZERO,
            participants: BTreeMap::new(),
            category: None,
            description: String::new(),
        }
    }

    /// Returns `true` if `student_id` participates in this event.
    #[must_use]
    pub fn has_participant(&self, student_id: &StudentId) -> bool {
        self.participants.contains_key(student_id)
    }
}

/// The root aggregate: every event plus the student → events index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    events: BTreeMap<EventId, Event>,
    #[serde(default)]
    student_events: BTreeMap<StudentId, Vec<EventId>>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from events without participants, keyed by their
    /// ids. A later event replaces an earlier one with the same id.
    pub(crate) fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events
                .into_iter()
                .map(|event| (event.id.clone(), event))
                .collect(),
            student_events: BTreeMap::new(),
        }
    }

    /// Iterates over all events in id order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// Number of events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Looks up an event.
    #[must_use]
    pub fn event(&self, event_id: &EventId) -> Option<&Event> {
        self.events.get(event_id)
    }

    /// Returns `true` if an event with this id exists.
    #[must_use]
    pub fn contains_event(&self, event_id: &EventId) -> bool {
        self.events.contains_key(event_id)
    }

    /// Events the student is enrolled in, in enrolment order.
    #[must_use]
    pub fn events_for_student(&self, student_id: &StudentId) -> &[EventId] {
        self.student_events
            .get(student_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over the student → events index.
    pub fn student_index(&self) -> impl Iterator<Item = (&StudentId, &[EventId])> {
        self.student_events
            .iter()
            .map(|(student, events)| (student, events.as_slice()))
    }

    /// Checks that the student index is the exact inverse of the
    /// participant maps.
    #[must_use]
    pub fn index_is_symmetric(&self) -> bool {
        let index_matches_events = self.student_events.iter().all(|(student, events)| {
            !events.is_empty()
                && events.iter().enumerate().all(|(i, event_id)| {
                    !events[..i].contains(event_id)
                        && self
                            .events
                            .get(event_id)
                            .is_some_and(|event| event.has_participant(student))
                })
        });
        let events_match_index = self.events.values().all(|event| {
            event
                .participants
                .keys()
                .all(|student| self.events_for_student(student).contains(&event.id))
        });
        index_matches_events && events_match_index
    }

    /// Inserts a new event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateId` if the id is already taken.
    pub(crate) fn insert_event(&mut self, event: Event) -> Result<(), DomainError> {
        if self.events.contains_key(&event.id) {
            return Err(DomainError::DuplicateId(event.id.to_string()));
        }
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    /// Mutable access to an existing event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist.
    pub(crate) fn event_mut(&mut self, event_id: &EventId) -> Result<&mut Event, DomainError> {
        self.events
            .get_mut(event_id)
            .ok_or_else(|| DomainError::NotFound(format!("event {event_id}")))
    }

    /// Enrols a student in an event on both sides of the index.
    ///
    /// Returns `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the event does not exist.
    pub(crate) fn enroll(
        &mut self,
        student_id: &StudentId,
        event_id: &EventId,
    ) -> Result<bool, DomainError> {
        let event = self.event_mut(event_id)?;
        let added_participant = if event.has_participant(student_id) {
            false
        } else {
            event
                .participants
                .insert(student_id.clone(), Participation::default());
            true
        };

        let student_events = self.student_events.entry(student_id.clone()).or_default();
        let added_index_entry = if student_events.contains(event_id) {
            false
        } else {
            student_events.push(event_id.clone());
            true
        };

        Ok(added_participant || added_index_entry)
    }

    /// Withdraws a student from an event on both sides of the index.
    ///
    /// Unknown events and non-member pairs are ignored. Returns `true` if
    /// anything changed.
    pub(crate) fn withdraw(&mut self, student_id: &StudentId, event_id: &EventId) -> bool {
        let removed_participant = self
            .events
            .get_mut(event_id)
            .and_then(|event| event.participants.remove(student_id))
            .is_some();

        let mut removed_index_entry = false;
        if let Some(student_events) = self.student_events.get_mut(student_id) {
            let before = student_events.len();
            student_events.retain(|id| id != event_id);
            removed_index_entry = student_events.len() != before;
            if student_events.is_empty() {
                self.student_events.remove(student_id);
            }
        }

        removed_participant || removed_index_entry
    }

    /// Recomputes prices for one event.
    pub(crate) fn reallocate(&mut self, event_id: &EventId) -> Option<Allocation> {
        self.events.get_mut(event_id).and_then(allocation::reallocate)
    }

    /// Recomputes prices for every event.
    pub(crate) fn reallocate_all(&mut self) {
        for event in self.events.values_mut() {
            allocation::reallocate(event);
        }
    }
}
