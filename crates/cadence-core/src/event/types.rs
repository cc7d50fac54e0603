//! Field kinds: the closed set of item fields replay understands.
//!
//! Tracker changelogs report field changes under raw identifiers. Instead
//! of probing for attributes at runtime, every identifier is resolved once
//! (via [`crate::config::FieldMap`]) into a tagged kind; identifiers nobody
//! configured resolve to [`FieldKind::Other`] and are ignored by replay.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of field a change event applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Item owner. An empty target value means unassigned.
    Assignee,
    /// Workflow status.
    Status,
    /// Health custom field.
    Health,
    /// Archival flag custom field.
    Archived,
    /// A field no configuration maps; carried but never replayed.
    Other(String),
}

impl FieldKind {
    /// Canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Assignee => "assignee",
            Self::Status => "status",
            Self::Health => "health",
            Self::Archived => "archived",
            Self::Other(raw) => raw,
        }
    }

    /// Returns true for kinds that participate in replay.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Custom serde: a field kind is just its canonical string on the wire.
impl Serialize for FieldKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "assignee" => Self::Assignee,
            "status" => Self::Status,
            "health" => Self::Health,
            "archived" => Self::Archived,
            _ => Self::Other(s),
        })
    }
}
