//! `cad summary` — cycle-time distribution per phase per quarter.

use std::convert::Infallible;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;

use cadence_core::config::{OutlierThresholds, PhaseConfig};
use cadence_core::cycles::PhaseCycleCalculator;
use cadence_core::model::Phase;
use cadence_report::stats::{BucketStats, quarter_bucket, summarize};

use crate::cmd::{load_event_logs_reported, resolve_reference_now};
use crate::output::{OutputMode, render};

/// Arguments for `cad summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Changelog export file (JSON).
    #[arg(long, value_name = "PATH")]
    pub events: PathBuf,

    /// Reference date for censored phases (defaults to now).
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Override the minimum plausible duration, in weeks.
    #[arg(long, value_name = "WEEKS")]
    pub min_weeks: Option<f64>,

    /// Override the maximum plausible duration, in weeks.
    #[arg(long, value_name = "WEEKS")]
    pub max_weeks: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    phase: Phase,
    bucket: String,
    #[serde(flatten)]
    stats: BucketStats,
}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    reference_now: DateTime<Utc>,
    min_weeks: f64,
    max_weeks: f64,
    rows: Vec<SummaryRow>,
}

/// Execute `cad summary`.
pub fn run_summary(
    args: &SummaryArgs,
    output: OutputMode,
    config: &PhaseConfig,
) -> anyhow::Result<()> {
    let logs = load_event_logs_reported(&args.events, config, output)?;
    let reference_now = resolve_reference_now(args.as_of);

    let thresholds = OutlierThresholds {
        min_weeks: args.min_weeks.unwrap_or(config.thresholds.min_weeks),
        max_weeks: args.max_weeks.unwrap_or(config.thresholds.max_weeks),
    };

    let calculator = PhaseCycleCalculator::new(config);
    let records =
        calculator.compute_batch(logs.into_iter().map(Ok::<_, Infallible>), reference_now);

    let mut rows = Vec::new();
    for phase in Phase::ALL {
        let phase_records: Vec<_> = records
            .iter()
            .filter(|r| r.phase == phase)
            .cloned()
            .collect();
        let buckets = summarize(&phase_records, &thresholds, quarter_bucket(reference_now));
        for (bucket, stats) in buckets {
            rows.push(SummaryRow {
                phase,
                bucket,
                stats,
            });
        }
    }

    let payload = SummaryOutput {
        reference_now,
        min_weeks: thresholds.min_weeks,
        max_weeks: thresholds.max_weeks,
        rows,
    };

    render(output, &payload, render_summary_human)
}

fn render_summary_human(payload: &SummaryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.rows.is_empty() {
        writeln!(w, "No in-threshold cycle records to summarize.")?;
        return Ok(());
    }

    writeln!(
        w,
        "{:<10} {:<9} {:>5} {:>9} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "phase", "bucket", "n", "outliers", "min", "q1", "median", "q3", "max"
    )?;
    for row in &payload.rows {
        writeln!(
            w,
            "{:<10} {:<9} {:>5} {:>9} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2}",
            row.phase,
            row.bucket,
            row.stats.project_count,
            row.stats.outlier_count,
            row.stats.calendar.min,
            row.stats.calendar.q1,
            row.stats.calendar.median,
            row.stats.calendar.q3,
            row.stats.calendar.max
        )?;
        writeln!(
            w,
            "{:<10} {:<9} {:>5} {:>9} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2}",
            "",
            "(active)",
            "",
            "",
            row.stats.active.min,
            row.stats.active.q1,
            row.stats.active.median,
            row.stats.active.q3,
            row.stats.active.max
        )?;
    }

    Ok(())
}
