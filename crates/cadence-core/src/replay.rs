//! Point-in-time state reconstruction.
//!
//! Replays an [`EventLog`] up to a cutoff instant and produces the item's
//! believed state at that instant. The fold is last-write-wins per field in
//! timestamp order; a snapshot is a pure function of the events at or
//! before the cutoff, which is what makes the whole pipeline idempotent.

use chrono::{DateTime, Utc};

use crate::config::PhaseConfig;
use crate::event::{EventLog, FieldKind};
use crate::model::{Health, Snapshot};

/// Replays event logs into [`Snapshot`]s.
#[derive(Debug, Clone, Copy)]
pub struct StateReconstructor<'a> {
    config: &'a PhaseConfig,
}

impl<'a> StateReconstructor<'a> {
    #[must_use]
    pub const fn new(config: &'a PhaseConfig) -> Self {
        Self { config }
    }

    /// Reconstruct the item's state as of `as_of`.
    ///
    /// Returns `None` when `as_of` precedes the item's creation timestamp
    /// (the item did not yet exist — not an error), and for logs with no
    /// creation timestamp at all (nothing to replay).
    #[must_use]
    pub fn reconstruct(&self, log: &EventLog, as_of: DateTime<Utc>) -> Option<Snapshot> {
        let created = log.creation_timestamp()?;
        if created > as_of {
            return None;
        }

        let mut assignee: Option<String> = None;
        let mut status = "Unknown".to_string();
        let mut health = Health::Unknown;
        let mut archived = false;

        for event in log.events_until(as_of) {
            match &event.field {
                FieldKind::Assignee => {
                    assignee = non_empty(event.to_value.as_deref()).map(ToString::to_string);
                }
                FieldKind::Status => {
                    if let Some(value) = non_empty(event.to_value.as_deref()) {
                        status = value.to_string();
                    }
                }
                FieldKind::Health => {
                    health = event
                        .to_value
                        .as_deref()
                        .map_or(Health::Unknown, Health::classify);
                }
                FieldKind::Archived => {
                    archived = event
                        .to_value
                        .as_deref()
                        .is_some_and(|v| self.config.fields.is_truthy(v));
                }
                FieldKind::Other(_) => {}
            }
        }

        let is_active = !(self.config.classes.is_terminal(&status) || archived);

        Some(Snapshot {
            item_key: log.item_key().to_string(),
            as_of,
            assignee,
            status,
            health,
            archived,
            is_active,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
