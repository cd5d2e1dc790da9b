//! Schoolfund Events — event participation and cost-allocation context.
//!
//! Tracks which students take part in which school events, splits each
//! event's cost between its participants net of pooled fundraising, and
//! upgrades older document files on load.

pub mod application;
pub mod domain;

pub use application::query_handlers::{EventCostSummary, ParticipantView};
pub use application::store::EventRecordStore;
pub use domain::aggregates::{Document, Event, Participation};
pub use domain::commands::{EventPatch, NewEvent};
pub use domain::ids::{EventId, StudentId};
pub use domain::money::Money;
pub use domain::roster::{StudentDirectory, StudentRecord};
