//! Commands for the event participation context.
//!
//! `NewEvent` and `EventPatch` deserialize from the same keys the document
//! file uses, so import code can hand over raw JSON rows.

use chrono::NaiveDate;
use schoolfund_core::error::DomainError;
use serde::Deserialize;
use uuid::Uuid;

use super::aggregates::Event;
use super::ids::EventId;
use super::money::Money;

/// Date formats accepted for events, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Data for creating an event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewEvent {
    /// Explicit identifier; derived from the name when absent.
    #[serde(default)]
    pub id: Option<EventId>,
    /// Display name (required).
    #[serde(rename = "nom", alias = "name", default)]
    pub name: String,
    /// Date, `YYYY-MM-DD` or `DD/MM/YYYY`; may be empty.
    #[serde(default)]
    pub date: String,
    /// Total cost (defaults to zero).
    #[serde(rename = "cout_total", alias = "total_cost", default)]
    pub total_cost: Money,
    /// Optional category.
    #[serde(rename = "categorie", alias = "category", default)]
    pub category: Option<String>,
    /// Description (defaults to empty).
    #[serde(default)]
    pub description: Option<String>,
    /// Whether pooled sales apply (defaults to `false`).
    #[serde(rename = "ventes_activees", alias = "sales_enabled", default)]
    pub sales_enabled: Option<bool>,
    /// Pooled sales already raised (defaults to zero).
    #[serde(rename = "total_ventes", alias = "total_sales", default)]
    pub total_sales: Option<Money>,
}

impl NewEvent {
    /// Starts a new event with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets an explicit identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<EventId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Sets the total cost.
    #[must_use]
    pub fn with_total_cost(mut self, total_cost: Money) -> Self {
        self.total_cost = total_cost;
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parses creation data from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the object has the wrong shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DomainError> {
        serde_json::from_value(value)
            .map_err(|e| DomainError::Validation(format!("invalid event data: {e}")))
    }

    /// Validates the data and builds the event, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name, a negative amount
    /// or a malformed date.
    pub fn into_event(self) -> Result<Event, DomainError> {
        let name = validate_name(&self.name)?;
        validate_date(&self.date)?;
        validate_amount("total cost", self.total_cost)?;
        let total_sales = self.total_sales.unwrap_or_default();
        validate_amount("total sales", total_sales)?;

        let id = match self.id {
            Some(id) if id.as_str().trim().is_empty() => {
                return Err(DomainError::Validation("event id must not be blank".into()));
            }
            Some(id) => id,
            None => derive_event_id(&name),
        };

        let mut event = Event::new(id, name);
        event.date = self.date.trim().to_owned();
        event.total_cost = self.total_cost;
        event.category = normalize_category(self.category);
        event.description = self.description.unwrap_or_default();
        event.sales_enabled = self.sales_enabled.unwrap_or(false);
        event.total_sales = total_sales;
        Ok(event)
    }
}

/// Partial update of an event's editable fields.
///
/// Participants, pooled sales and derived prices are not part of the
/// allow-list; JSON carrying them is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventPatch {
    /// New display name.
    #[serde(rename = "nom", alias = "name", default)]
    pub name: Option<String>,
    /// New date.
    #[serde(default)]
    pub date: Option<String>,
    /// New category; an empty string clears it.
    #[serde(rename = "categorie", alias = "category", default)]
    pub category: Option<String>,
    /// New total cost.
    #[serde(rename = "cout_total", alias = "total_cost", default)]
    pub total_cost: Option<Money>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Enables or disables pooled sales.
    #[serde(rename = "ventes_activees", alias = "sales_enabled", default)]
    pub sales_enabled: Option<bool>,
}

impl EventPatch {
    /// Parses a patch from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the object names a field outside
    /// the allow-list or has the wrong shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DomainError> {
        serde_json::from_value(value)
            .map_err(|e| DomainError::Validation(format!("invalid event update: {e}")))
    }

    /// Checks every field the patch sets.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name, a negative cost or
    /// a malformed date.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(date) = &self.date {
            validate_date(date)?;
        }
        if let Some(total_cost) = self.total_cost {
            validate_amount("total cost", total_cost)?;
        }
        Ok(())
    }

    /// Applies the patch to `event`. Call [`EventPatch::validate`] first.
    pub(crate) fn apply_to(self, event: &mut Event) {
        if let Some(name) = self.name {
            event.name = name.trim().to_owned();
        }
        if let Some(date) = self.date {
            event.date = date.trim().to_owned();
        }
        if let Some(category) = self.category {
            event.category = normalize_category(Some(category));
        }
        if let Some(total_cost) = self.total_cost {
            event.total_cost = total_cost;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(sales_enabled) = self.sales_enabled {
            event.sales_enabled = sales_enabled;
        }
    }
}

/// Parses an event date in either accepted format.
///
/// Returns `None` for empty or malformed input.
#[must_use]
pub fn parse_event_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("event name must not be empty".into()));
    }
    Ok(name.to_owned())
}

fn validate_date(date: &str) -> Result<(), DomainError> {
    if date.trim().is_empty() || parse_event_date(date).is_some() {
        return Ok(());
    }
    Err(DomainError::Validation(format!(
        "date '{date}' must be YYYY-MM-DD or DD/MM/YYYY"
    )))
}

/// Rejects negative amounts and amounts above [`Money::MAX`].
pub(crate) fn validate_amount(label: &str, amount: Money) -> Result<(), DomainError> {
    if amount.is_negative() {
        return Err(DomainError::Validation(format!(
            "{label} must not be negative (got {amount})"
        )));
    }
    if !amount.is_representable() {
        return Err(DomainError::Validation(format!(
            "{label} must not exceed {} (got {amount})",
            Money::MAX
        )));
    }
    Ok(())
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
}

/// Derives an identifier from an event name: lowercase, with each run of
/// non-alphanumeric characters collapsed to `_`.
#[must_use]
pub fn derive_event_id(name: &str) -> EventId {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        let uuid = Uuid::new_v4().simple().to_string();
        return EventId::new(format!("evt-{}", &uuid[..8]));
    }
    EventId::new(slug)
}
