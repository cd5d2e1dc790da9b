//! Cost allocation: splitting an event's cost across its participants.

use serde::Serialize;

use super::aggregates::{Event, Participation};
use super::money::Money;

/// Per-head amounts for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Total cost divided by the participant count.
    pub base_price: Money,
    /// Pooled sales divided by the participant count.
    pub discount_per_head: Money,
    /// Base price minus discount, floored at zero.
    pub final_price: Money,
}

impl Allocation {
    /// The participation entry every participant receives.
    #[must_use]
    pub fn participation(&self) -> Participation {
        Participation {
            base_price: self.base_price,
            final_price: self.final_price,
        }
    }
}

/// Computes the per-head allocation for `participants` people.
///
/// Returns `None` when there is nobody to allocate to. Pooled sales only
/// count when sales are enabled and the total is positive.
#[must_use]
pub fn compute(
    total_cost: Money,
    sales_enabled: bool,
    total_sales: Money,
    participants: usize,
) -> Option<Allocation> {
    if participants == 0 {
        return None;
    }

    let base_price = total_cost.split(participants);
    let discount_per_head = if sales_enabled && total_sales > Money::ZERO {
        total_sales.split(participants)
    } else {
        Money::ZERO
    };
    let final_price = base_price.saturating_sub_floor_zero(discount_per_head);

    Some(Allocation {
        base_price,
        discount_per_head,
        final_price,
    })
}

/// Computes the allocation for `event` from its current fields.
#[must_use]
pub fn for_event(event: &Event) -> Option<Allocation> {
    compute(
        event.total_cost,
        event.sales_enabled,
        event.total_sales,
        event.participants.len(),
    )
}

/// Recomputes prices and writes them into every participant of `event`.
///
/// An event without participants is left untouched.
pub fn reallocate(event: &mut Event) -> Option<Allocation> {
    let allocation = for_event(event)?;
    let participation = allocation.participation();
    for entry in event.participants.values_mut() {
        *entry = participation;
    }
    tracing::debug!(
        event_id = %event.id,
        participants = event.participants.len(),
        base_price = %allocation.base_price,
        final_price = %allocation.final_price,
        "reallocated event cost"
    );
    Some(allocation)
}
