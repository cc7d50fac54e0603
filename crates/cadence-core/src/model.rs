//! Item-level data model: health classification, lifecycle phases, and the
//! two derived record types (snapshots and cycle records).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Health classification of a tracked item.
///
/// Raw health values arrive as free-form strings from a tracker custom
/// field; [`Health::classify`] maps them onto this closed set. Absence is a
/// valid real-world state, represented as `Unknown` — never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    OnTrack,
    OffTrack,
    AtRisk,
    Complete,
    OnHold,
    Mystery,
    Unknown,
}

impl Health {
    /// All health classes in reporting order.
    pub const ALL: [Self; 7] = [
        Self::OnTrack,
        Self::OffTrack,
        Self::AtRisk,
        Self::Complete,
        Self::OnHold,
        Self::Mystery,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::OffTrack => "Off Track",
            Self::AtRisk => "At Risk",
            Self::Complete => "Complete",
            Self::OnHold => "On Hold",
            Self::Mystery => "Mystery",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify a raw health string by case-insensitive substring match.
    ///
    /// Order matters: "at risk" is checked before the bare "risk" fallback,
    /// and anything unrecognized resolves to `Unknown`.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.is_empty() {
            return Self::Unknown;
        }
        if lower.contains("on track") {
            Self::OnTrack
        } else if lower.contains("off track") {
            Self::OffTrack
        } else if lower.contains("at risk") || lower.contains("risk") {
            Self::AtRisk
        } else if lower.contains("complete") {
            Self::Complete
        } else if lower.contains("on hold") {
            Self::OnHold
        } else if lower.contains("mystery") {
            Self::Mystery
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two lifecycle phases cycle times are computed for.
///
/// Each phase is bounded by a start status class and the next phase's
/// status class; the class memberships themselves live in
/// [`crate::config::PhaseClasses`] (configuration, not derived data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discovery,
    Build,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Self; 2] = [Self::Discovery, Self::Build];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Phase {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" => Ok(Self::Discovery),
            "build" => Ok(Self::Build),
            _ => Err(ParseEnumError {
                expected: "phase",
                got: s.to_string(),
            }),
        }
    }
}

/// The reconstructed state of one item at one instant.
///
/// A snapshot at `as_of = T` is a pure function of the events with
/// `timestamp <= T`; nothing else may influence it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub item_key: String,
    pub as_of: DateTime<Utc>,
    /// Current assignee; `None` means unassigned.
    pub assignee: Option<String>,
    /// Raw workflow status value, `"Unknown"` until the first status event.
    pub status: String,
    pub health: Health,
    pub archived: bool,
    /// False when the status is terminal or the item is archived.
    pub is_active: bool,
}

/// One phase duration for one item.
///
/// `censored = true` means the phase had not ended as of the analysis
/// reference time; `end` is then `None` and the duration is measured
/// against that reference time instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub item_key: String,
    pub phase: Phase,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Exact elapsed time of the phase, in fractional weeks.
    pub calendar_weeks: f64,
    /// Calendar weeks minus time spent in a hold-class status.
    pub active_weeks: f64,
    pub excluded_weeks: f64,
    pub censored: bool,
}
