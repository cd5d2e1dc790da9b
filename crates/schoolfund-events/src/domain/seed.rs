//! Built-in sample data used when no document can be loaded.

use super::aggregates::{Document, Event};
use super::money::Money;

fn sample_event(
    id: &str,
    name: &str,
    date: &str,
    total_cost_cents: i64,
    category: &str,
    description: &str,
) -> Event {
    let mut event = Event::new(id, name);
    event.date = date.to_owned();
    event.total_cost = Money::from_cents(total_cost_cents);
    event.category = Some(category.to_owned());
    event.description = description.to_owned();
    event
}

/// Returns the seed document: three sample events without participants.
#[must_use]
pub fn seed_document() -> Document {
    Document::from_events([
        sample_event(
            "sortie_musee",
            "Sortie au musée",
            "2025-03-14",
            45_000,
            "Culture",
            "Visite guidée et atelier.",
        ),
        sample_event(
            "voyage_ski",
            "Voyage au ski",
            "2025-02-10",
            520_000,
            "Sport",
            "Séjour de cinq jours, transport et hébergement compris.",
        ),
        sample_event(
            "concert",
            "Concert de fin d'année",
            "20/06/2025",
            30_000,
            "Musique",
            "Location de la salle et du matériel.",
        ),
    ])
}
