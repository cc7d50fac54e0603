//! Property tests for the distribution statistics.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use cadence_core::config::OutlierThresholds;
use cadence_core::model::{CycleRecord, Phase};
use cadence_report::stats::{DurationStats, summarize};

fn record(calendar: f64) -> CycleRecord {
    CycleRecord {
        item_key: "HT-prop".to_string(),
        phase: Phase::Discovery,
        start: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("ts"),
        end: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).single().expect("ts")),
        calendar_weeks: calendar,
        active_weeks: calendar,
        excluded_weeks: 0.0,
        censored: false,
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn five_number_summary_is_ordered(values in prop::collection::vec(0.0_f64..100.0, 1..50)) {
        let stats = DurationStats::from_values(values.clone()).expect("non-empty");
        prop_assert!(stats.min <= stats.q1 + 1e-9);
        prop_assert!(stats.q1 <= stats.median + 1e-9);
        prop_assert!(stats.median <= stats.q3 + 1e-9);
        prop_assert!(stats.q3 <= stats.max + 1e-9);

        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((stats.min - lo).abs() < 1e-9);
        prop_assert!((stats.max - hi).abs() < 1e-9);
    }

    #[test]
    fn every_record_is_either_counted_or_an_outlier(
        durations in prop::collection::vec(0.0_f64..60.0, 0..40),
    ) {
        let thresholds = OutlierThresholds::default();
        let records: Vec<_> = durations.iter().map(|&d| record(d)).collect();

        let summary = summarize(&records, &thresholds, |_| "all".to_string());

        let accounted = summary
            .get("all")
            .map_or(0, |bucket| bucket.project_count + bucket.outlier_count);
        let expected_in = durations
            .iter()
            .filter(|&&d| d >= thresholds.min_weeks && d <= thresholds.max_weeks)
            .count();

        if expected_in == 0 {
            // Buckets with no in-threshold records are omitted entirely.
            prop_assert!(summary.is_empty());
        } else {
            prop_assert_eq!(accounted, durations.len());
        }
    }
}
