use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An upload campaign created by the organizer.
///
/// Records are immutable once created and looked up solely by `id`. Field names
/// match the persisted registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: String,
    pub place: String,
    /// Public URL of the background image.
    pub bg: String,
}

impl Event {
    /// Allocate a fresh event with a random 32-hex-character id.
    pub fn new(new_event: NewEvent) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: new_event.name,
            date: new_event.date,
            place: new_event.place,
            bg: new_event.bg,
        }
    }
}

/// Fields supplied by the admin when creating an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub place: String,
    pub bg: String,
}

/// Event as returned to the admin, with its guest link.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub guest_link: String,
}
