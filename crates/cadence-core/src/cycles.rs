//! Phase cycle-time computation.
//!
//! Scans a status-change history for first-occurrence transitions into each
//! phase's start class and derives one duration record per phase per item,
//! distinguishing calendar time from active time (hold periods excluded)
//! and marking phases that have not ended yet as censored.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::warn;

use crate::config::{PhaseConfig, class_contains};
use crate::error::ErrorCode;
use crate::event::{Event, EventLog};
use crate::model::{CycleRecord, Phase};

/// Seconds in one week, for exact elapsed-time conversion.
const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Convert an exact elapsed duration to fractional weeks.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_weeks(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / (SECONDS_PER_WEEK * 1_000.0)
}

/// Computes [`CycleRecord`]s from event logs.
#[derive(Debug, Clone, Copy)]
pub struct PhaseCycleCalculator<'a> {
    config: &'a PhaseConfig,
}

impl<'a> PhaseCycleCalculator<'a> {
    #[must_use]
    pub const fn new(config: &'a PhaseConfig) -> Self {
        Self { config }
    }

    /// Compute cycle records for every phase of one item.
    ///
    /// Phases the item never entered produce no record at all — absence of
    /// data, not a zero-duration point. Phases without a qualifying end
    /// transition are censored against `reference_now`.
    #[must_use]
    pub fn compute_cycles(
        &self,
        log: &EventLog,
        reference_now: DateTime<Utc>,
    ) -> Vec<CycleRecord> {
        Phase::ALL
            .iter()
            .filter_map(|&phase| self.compute_phase(log, phase, reference_now))
            .collect()
    }

    /// Compute cycle records across a batch of retrieval results.
    ///
    /// Retrieval of an item's history is external and may fail transiently;
    /// a failed item degrades to "no records for this item" with a warning
    /// and never aborts the batch.
    #[must_use]
    pub fn compute_batch<E: fmt::Display>(
        &self,
        results: impl IntoIterator<Item = Result<EventLog, E>>,
        reference_now: DateTime<Utc>,
    ) -> Vec<CycleRecord> {
        let mut records = Vec::new();
        for result in results {
            match result {
                Ok(log) => records.extend(self.compute_cycles(&log, reference_now)),
                Err(e) => {
                    warn!(error = %e, "skipping item whose history could not be retrieved");
                }
            }
        }
        records
    }

    fn compute_phase(
        &self,
        log: &EventLog,
        phase: Phase,
        reference_now: DateTime<Utc>,
    ) -> Option<CycleRecord> {
        let status_events: Vec<&Event> = log.status_events().collect();
        let start_class = self.config.classes.start_class(phase);
        let end_class = self.config.classes.end_class(phase);

        // First occurrence opens the phase; a later reversion into the same
        // class does not move the start.
        let start_idx = status_events
            .iter()
            .position(|e| to_value_in_class(e, start_class))?;
        let start = status_events[start_idx].timestamp;

        // The phase ends at the first transition into the next class that
        // comes after the start in replay order.
        let end_event = status_events[start_idx + 1..]
            .iter()
            .find(|e| to_value_in_class(e, end_class));

        let (end_instant, end, censored) = match end_event {
            Some(e) => (e.timestamp, Some(e.timestamp), false),
            None => (reference_now, None, true),
        };

        let calendar_weeks = duration_weeks(end_instant - start);
        if calendar_weeks < 0.0 {
            // Out-of-order events upstream. Reported as-is so downstream
            // consumers can detect the anomaly.
            warn!(
                code = %ErrorCode::NegativeDuration,
                item = log.item_key(),
                phase = %phase,
                calendar_weeks,
                "negative phase duration; events are out of timestamp order"
            );
        }

        let excluded_weeks = if calendar_weeks > 0.0 {
            self.hold_overlap_weeks(log, start, end_instant)
        } else {
            0.0
        };
        let active_weeks = calendar_weeks - excluded_weeks;

        Some(CycleRecord {
            item_key: log.item_key().to_string(),
            phase,
            start,
            end,
            calendar_weeks,
            active_weeks,
            excluded_weeks,
            censored,
        })
    }

    /// Sum the time spent in a hold-class status within `[start, end]`.
    ///
    /// Walks the full status timeline: each status value holds from its
    /// transition until the next one (the last holds until `end`), and each
    /// hold-class residency contributes its actual overlap with the
    /// interval. The overlap can never exceed the interval, so
    /// `active_weeks >= 0` holds structurally.
    fn hold_overlap_weeks(
        &self,
        log: &EventLog,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> f64 {
        let mut excluded = Duration::zero();
        // Status before the first transition is unknown, never hold-class.
        let mut current: Option<(&str, DateTime<Utc>)> = None;

        for event in log.status_events() {
            let Some(to) = event.to_value.as_deref().map(str::trim).filter(|v| !v.is_empty())
            else {
                continue;
            };
            if let Some((status, since)) = current {
                if self.config.classes.is_hold(status) {
                    excluded += clipped_overlap(since, event.timestamp, start, end);
                }
            }
            current = Some((to, event.timestamp));
        }

        if let Some((status, since)) = current {
            if self.config.classes.is_hold(status) {
                excluded += clipped_overlap(since, end, start, end);
            }
        }

        duration_weeks(excluded)
    }
}

fn to_value_in_class(event: &Event, class: &[String]) -> bool {
    event
        .to_value
        .as_deref()
        .is_some_and(|v| class_contains(class, v))
}

/// The portion of `[seg_start, seg_end)` that falls within `[start, end]`.
fn clipped_overlap(
    seg_start: DateTime<Utc>,
    seg_end: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Duration {
    let s = seg_start.max(start);
    let e = seg_end.min(end);
    if e > s { e - s } else { Duration::zero() }
}
