//! Cohort aggregation over reconstructed snapshots.
//!
//! For a grid of cutoff dates (typically weekly), every item's state is
//! reconstructed and the active items are counted per cohort: per team
//! member (with a health and status breakdown), per health class, and per
//! workflow status. Inactive and not-yet-existing items are skipped.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use cadence_core::config::PhaseConfig;
use cadence_core::event::EventLog;
use cadence_core::model::Health;
use cadence_core::replay::StateReconstructor;

/// Member label used when an active item has no assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Fixed-shape health counts. One field per health class, so an unknown
/// key cannot be silently accepted the way a string-keyed map would.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthBreakdown {
    pub on_track: usize,
    pub off_track: usize,
    pub at_risk: usize,
    pub complete: usize,
    pub on_hold: usize,
    pub mystery: usize,
    pub unknown: usize,
}

impl HealthBreakdown {
    fn record(&mut self, health: Health) {
        match health {
            Health::OnTrack => self.on_track += 1,
            Health::OffTrack => self.off_track += 1,
            Health::AtRisk => self.at_risk += 1,
            Health::Complete => self.complete += 1,
            Health::OnHold => self.on_hold += 1,
            Health::Mystery => self.mystery += 1,
            Health::Unknown => self.unknown += 1,
        }
    }

    #[must_use]
    pub const fn count_for(&self, health: Health) -> usize {
        match health {
            Health::OnTrack => self.on_track,
            Health::OffTrack => self.off_track,
            Health::AtRisk => self.at_risk,
            Health::Complete => self.complete,
            Health::OnHold => self.on_hold,
            Health::Mystery => self.mystery,
            Health::Unknown => self.unknown,
        }
    }
}

/// One team member's active items at one snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub date: DateTime<Utc>,
    pub member: String,
    pub total: usize,
    #[serde(flatten)]
    pub health: HealthBreakdown,
    /// Active item count per observed workflow status.
    pub statuses: BTreeMap<String, usize>,
}

/// Project-wide count for one health class at one snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRow {
    pub date: DateTime<Utc>,
    pub health: Health,
    pub count: usize,
}

/// Project-wide count for one workflow status at one snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub date: DateTime<Utc>,
    pub status: String,
    pub count: usize,
}

/// The three parallel cohort tables, one row per cohort per date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortTable {
    pub members: Vec<MemberRow>,
    pub health: Vec<HealthRow>,
    pub status: Vec<StatusRow>,
}

/// Aggregates reconstructed snapshots into [`CohortTable`]s.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotAggregator<'a> {
    config: &'a PhaseConfig,
}

impl<'a> SnapshotAggregator<'a> {
    #[must_use]
    pub const fn new(config: &'a PhaseConfig) -> Self {
        Self { config }
    }

    /// Aggregate all items over the given cutoff dates.
    ///
    /// Items whose snapshot is `None` (not yet created) or inactive are
    /// skipped; the remainder is counted into all three tables. Pure
    /// aggregation — rerunning over the same logs yields the same tables.
    #[must_use]
    pub fn aggregate(&self, logs: &[EventLog], cutoff_dates: &[DateTime<Utc>]) -> CohortTable {
        tracing::debug!(
            items = logs.len(),
            dates = cutoff_dates.len(),
            "aggregating snapshots"
        );
        let reconstructor = StateReconstructor::new(self.config);
        let mut table = CohortTable::default();

        for &date in cutoff_dates {
            let mut members: BTreeMap<String, MemberAccum> = BTreeMap::new();
            let mut health_counts = HealthBreakdown::default();
            let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();

            for log in logs {
                let Some(snapshot) = reconstructor.reconstruct(log, date) else {
                    continue;
                };
                if !snapshot.is_active {
                    continue;
                }

                let member = snapshot
                    .assignee
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED.to_string());
                let accum = members.entry(member).or_default();
                accum.total += 1;
                accum.health.record(snapshot.health);
                *accum.statuses.entry(snapshot.status.clone()).or_default() += 1;

                health_counts.record(snapshot.health);
                *status_counts.entry(snapshot.status).or_default() += 1;
            }

            for (member, accum) in members {
                table.members.push(MemberRow {
                    date,
                    member,
                    total: accum.total,
                    health: accum.health,
                    statuses: accum.statuses,
                });
            }

            // The health table carries every class, zeros included, so
            // downstream charts get a stable row set.
            for health in Health::ALL {
                table.health.push(HealthRow {
                    date,
                    health,
                    count: health_counts.count_for(health),
                });
            }

            for (status, count) in status_counts {
                table.status.push(StatusRow {
                    date,
                    status,
                    count,
                });
            }
        }

        table
    }
}

#[derive(Debug, Default)]
struct MemberAccum {
    total: usize,
    health: HealthBreakdown,
    statuses: BTreeMap<String, usize>,
}

/// Weekly cutoff grid from `from` to `to` inclusive.
///
/// Steps by exactly seven days; `to` is appended when the last step does
/// not land on it, so the grid always ends at the requested boundary.
/// Returns an empty grid when `from > to`.
#[must_use]
pub fn weekly_dates(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    if from > to {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        dates.push(current);
        current += Duration::weeks(1);
    }
    if dates.last() != Some(&to) {
        dates.push(to);
    }
    dates
}
