//! Change events and the per-item event log.

pub mod parser;
pub mod types;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use types::FieldKind;

/// One recorded field change for one tracked item.
///
/// Events are immutable once recorded upstream; the engine treats them as a
/// read-only append log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub item_key: String,
    pub timestamp: DateTime<Utc>,
    pub field: FieldKind,
    pub from_value: Option<String>,
    pub to_value: Option<String>,
}

/// The ordered change history of one tracked item.
///
/// Events are totally ordered by timestamp, with ties broken by
/// log-arrival order (stable sort on construction). Replay processes them
/// in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    item_key: String,
    created: Option<DateTime<Utc>>,
    events: Vec<Event>,
}

impl EventLog {
    /// Build a log from unordered-on-arrival events.
    #[must_use]
    pub fn new(
        item_key: impl Into<String>,
        created: Option<DateTime<Utc>>,
        mut events: Vec<Event>,
    ) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self {
            item_key: item_key.into(),
            created,
            events,
        }
    }

    #[must_use]
    pub fn item_key(&self) -> &str {
        &self.item_key
    }

    /// Events in replay order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// The instant the item came into existence: the exported creation
    /// timestamp when present, else the first event's timestamp.
    #[must_use]
    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created.or_else(|| self.events.first().map(|e| e.timestamp))
    }

    /// Status-change events only, in replay order.
    pub fn status_events(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| e.field == FieldKind::Status)
    }

    /// Events at or before the cutoff, in replay order.
    pub fn events_until(&self, as_of: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        self.events.iter().take_while(move |e| e.timestamp <= as_of)
    }
}
