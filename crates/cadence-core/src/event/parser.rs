//! Changelog export parser.
//!
//! Parses a tracker changelog export (JSON) into per-item [`EventLog`]s.
//! This is the single parsing layer for the whole pipeline, and it owns the
//! one fallback policy:
//!
//! - A history entry whose timestamp cannot be parsed is skipped with a
//!   `tracing` warning; the rest of the item's history still replays.
//! - A field identifier no configuration maps becomes
//!   [`FieldKind::Other`] and is carried but never replayed.
//! - Only a structurally invalid document (not JSON, wrong shape) is an
//!   error; per-event problems never abort the batch.
//!
//! # Export shape
//!
//! ```json
//! [
//!   {"item_key": "HT-42", "created": "2025-01-03T09:00:00Z",
//!    "histories": [
//!      {"timestamp": "2025-01-10T14:30:00Z",
//!       "items": [{"field": "status", "from_value": "01 Inbox",
//!                  "to_value": "02 Generative Discovery"}]}]}
//! ]
//! ```
//!
//! Jira-style spellings (`key`, `fromString`, `toString`, a history-level
//! `created` timestamp) are accepted as aliases.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::config::FieldMap;
use crate::error::ErrorCode;
use crate::event::{Event, EventLog};

/// Errors fatal to parsing an export document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid JSON or does not match the export shape.
    #[error("invalid changelog export: {0}")]
    InvalidExport(String),
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(alias = "key")]
    item_key: String,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    histories: Vec<RawHistory>,
}

#[derive(Debug, Deserialize)]
struct RawHistory {
    #[serde(alias = "created")]
    timestamp: String,
    #[serde(default)]
    items: Vec<RawChange>,
}

#[derive(Debug, Deserialize)]
struct RawChange {
    field: String,
    #[serde(default, alias = "fromString")]
    from_value: Option<String>,
    #[serde(default, alias = "toString")]
    to_value: Option<String>,
}

/// Parse a changelog export document into per-item event logs.
///
/// Items appear in first-appearance order; duplicate `item_key` entries are
/// merged into one log. Event order within a log is timestamp order with
/// arrival-order tie-breaking (see [`EventLog::new`]).
///
/// # Errors
///
/// Returns [`ParseError::InvalidExport`] when the document itself cannot be
/// deserialized. Per-event failures are skipped with a warning instead.
pub fn parse_export(input: &str, fields: &FieldMap) -> Result<Vec<EventLog>, ParseError> {
    let raw_items: Vec<RawItem> =
        serde_json::from_str(input).map_err(|e| ParseError::InvalidExport(e.to_string()))?;

    // First-appearance order, duplicates merged.
    let mut order: Vec<String> = Vec::new();
    let mut collected: HashMap<String, (Option<DateTime<Utc>>, Vec<Event>)> = HashMap::new();

    for raw_item in raw_items {
        let key = raw_item.item_key.trim().to_string();
        if key.is_empty() {
            warn!("skipping export entry with empty item key");
            continue;
        }

        let created = raw_item.created.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(
                    code = %ErrorCode::MalformedTimestamp,
                    item = %key,
                    raw,
                    "unparseable created timestamp; falling back to first event"
                );
            }
            parsed
        });

        let entry = collected.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            (None, Vec::new())
        });
        if entry.0.is_none() {
            entry.0 = created;
        }

        for history in raw_item.histories {
            let Some(timestamp) = parse_timestamp(&history.timestamp) else {
                warn!(
                    code = %ErrorCode::MalformedTimestamp,
                    item = %key,
                    raw = %history.timestamp,
                    "skipping history entry with malformed timestamp"
                );
                continue;
            };

            for change in history.items {
                entry.1.push(Event {
                    item_key: key.clone(),
                    timestamp,
                    field: fields.kind_of(&change.field),
                    from_value: change.from_value,
                    to_value: change.to_value,
                });
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|key| {
            let (created, events) = collected.remove(&key).unwrap_or((None, Vec::new()));
            EventLog::new(key, created, events)
        })
        .collect())
}

/// Defensive timestamp parsing across the formats trackers actually emit.
///
/// Accepted, in order: RFC 3339 (`Z` or `+05:00` offsets), tracker-style
/// offsets without a colon (`-0500`), naive datetimes (assumed UTC), and
/// bare dates (midnight UTC). Returns `None` rather than erroring — the
/// caller decides whether absence is skippable.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    None
}
