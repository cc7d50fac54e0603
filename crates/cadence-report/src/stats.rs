//! Outlier filtering and cycle-time distribution statistics.
//!
//! Cycle records carry data artifacts: near-zero durations from
//! back-to-back status flips, and multi-year durations from items that were
//! abandoned then revived. Records outside the configured thresholds are
//! excluded from the statistics but still counted, so the report shows how
//! much was filtered. Surviving records are grouped by a caller-supplied
//! bucket key derived from the phase *end* boundary — throughput credit
//! goes to the period the work concluded in.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use cadence_core::config::OutlierThresholds;
use cadence_core::model::CycleRecord;

/// Five-number summary of a duration distribution, in weeks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl DurationStats {
    /// Compute the summary over a non-empty set of values.
    ///
    /// Returns `None` for an empty set — quartiles of nothing are not a
    /// thing this type represents.
    #[must_use]
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        Some(Self {
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

/// Distribution summary for one reporting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketStats {
    /// Records inside the thresholds (the statistics population).
    pub project_count: usize,
    /// Records excluded by the thresholds.
    pub outlier_count: usize,
    pub calendar: DurationStats,
    pub active: DurationStats,
}

/// Quantile by linear interpolation between closest ranks.
///
/// `sorted` must be non-empty and ascending.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Calendar-quarter bucket key for a date, e.g. `"Q3 2025"`.
#[must_use]
pub fn quarter_key(date: DateTime<Utc>) -> String {
    let quarter = date.month0() / 3 + 1;
    format!("Q{} {}", quarter, date.year())
}

/// Bucket function assigning each record to the calendar quarter its phase
/// ended in; censored records use the analysis reference time.
pub fn quarter_bucket(reference_now: DateTime<Utc>) -> impl Fn(&CycleRecord) -> String {
    move |record| quarter_key(record.end.unwrap_or(reference_now))
}

/// Filter outliers and summarize the surviving durations per bucket.
///
/// A record is an outlier when its `calendar_weeks` falls outside
/// `[thresholds.min_weeks, thresholds.max_weeks]`; it is excluded from the
/// statistics but increments its bucket's `outlier_count`. Buckets with
/// zero in-threshold records are omitted entirely rather than emitting
/// degenerate statistics.
#[must_use]
pub fn summarize(
    records: &[CycleRecord],
    thresholds: &OutlierThresholds,
    bucket_fn: impl Fn(&CycleRecord) -> String,
) -> BTreeMap<String, BucketStats> {
    #[derive(Default)]
    struct Accum {
        calendar: Vec<f64>,
        active: Vec<f64>,
        outliers: usize,
    }

    let mut buckets: BTreeMap<String, Accum> = BTreeMap::new();

    for record in records {
        let accum = buckets.entry(bucket_fn(record)).or_default();
        if record.calendar_weeks < thresholds.min_weeks
            || record.calendar_weeks > thresholds.max_weeks
        {
            accum.outliers += 1;
        } else {
            accum.calendar.push(record.calendar_weeks);
            accum.active.push(record.active_weeks);
        }
    }

    buckets
        .into_iter()
        .filter_map(|(key, accum)| {
            let project_count = accum.calendar.len();
            let calendar = DurationStats::from_values(accum.calendar)?;
            let active = DurationStats::from_values(accum.active)?;
            Some((
                key,
                BucketStats {
                    project_count,
                    outlier_count: accum.outliers,
                    calendar,
                    active,
                },
            ))
        })
        .collect()
}
