//! `cad export` — write the full CSV artifact set for dashboards.

use std::convert::Infallible;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use cadence_core::config::PhaseConfig;
use cadence_core::cycles::PhaseCycleCalculator;
use cadence_core::model::{CycleRecord, Phase};
use cadence_report::cohort::{CohortTable, SnapshotAggregator, weekly_dates};
use cadence_report::stats::{BucketStats, quarter_bucket, summarize};

use crate::cmd::{csv_field, day_start, load_event_logs_reported, resolve_reference_now};
use crate::output::{OutputMode, render};

/// Arguments for `cad export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Changelog export file (JSON).
    #[arg(long, value_name = "PATH")]
    pub events: PathBuf,

    /// Output directory for the CSV files (created if missing).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Snapshot grid start date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub from: NaiveDate,

    /// Snapshot grid end date and cycle reference date (defaults to today).
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    files: Vec<PathBuf>,
}

/// Execute `cad export`.
pub fn run_export(args: &ExportArgs, output: OutputMode, config: &PhaseConfig) -> Result<()> {
    let logs = load_event_logs_reported(&args.events, config, output)?;
    let reference_now = resolve_reference_now(args.to);
    let dates = weekly_dates(day_start(args.from), reference_now);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output directory {}", args.out.display()))?;

    let table = SnapshotAggregator::new(config).aggregate(&logs, &dates);

    let calculator = PhaseCycleCalculator::new(config);
    let records =
        calculator.compute_batch(logs.into_iter().map(Ok::<_, Infallible>), reference_now);

    let mut files = Vec::new();

    let team_path = args.out.join("team_weekly.csv");
    write_team_csv(&team_path, &table)?;
    files.push(team_path);

    let health_path = args.out.join("health_weekly.csv");
    write_health_csv(&health_path, &table)?;
    files.push(health_path);

    let status_path = args.out.join("status_weekly.csv");
    write_status_csv(&status_path, &table)?;
    files.push(status_path);

    let cycles_path = args.out.join("cycle_records.csv");
    write_cycles_csv(&cycles_path, &records)?;
    files.push(cycles_path);

    let summary_path = args.out.join("quarterly_summary.csv");
    let mut summary_rows = Vec::new();
    for phase in Phase::ALL {
        let phase_records: Vec<_> = records
            .iter()
            .filter(|r| r.phase == phase)
            .cloned()
            .collect();
        for (bucket, stats) in summarize(
            &phase_records,
            &config.thresholds,
            quarter_bucket(reference_now),
        ) {
            summary_rows.push((phase, bucket, stats));
        }
    }
    write_summary_csv(&summary_path, &summary_rows)?;
    files.push(summary_path);

    let payload = ExportOutput { files };
    render(output, &payload, |payload, w| {
        writeln!(w, "Wrote {} files:", payload.files.len())?;
        for file in &payload.files {
            writeln!(w, "  {}", file.display())?;
        }
        Ok(())
    })
}

fn create_csv(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_team_csv(path: &Path, table: &CohortTable) -> Result<()> {
    let mut out = create_csv(path)?;
    writeln!(
        out,
        "date,team_member,total,on_track,off_track,at_risk,complete,on_hold,mystery,unknown_health,status_breakdown"
    )?;
    for row in &table.members {
        let breakdown = serde_json::to_string(&row.statuses)?;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            row.date.format("%Y-%m-%d"),
            csv_field(&row.member),
            row.total,
            row.health.on_track,
            row.health.off_track,
            row.health.at_risk,
            row.health.complete,
            row.health.on_hold,
            row.health.mystery,
            row.health.unknown,
            csv_field(&breakdown)
        )?;
    }
    Ok(())
}

fn write_health_csv(path: &Path, table: &CohortTable) -> Result<()> {
    let mut out = create_csv(path)?;
    writeln!(out, "date,health_status,count")?;
    for row in &table.health {
        writeln!(
            out,
            "{},{},{}",
            row.date.format("%Y-%m-%d"),
            csv_field(row.health.as_str()),
            row.count
        )?;
    }
    Ok(())
}

fn write_status_csv(path: &Path, table: &CohortTable) -> Result<()> {
    let mut out = create_csv(path)?;
    writeln!(out, "date,project_status,count")?;
    for row in &table.status {
        writeln!(
            out,
            "{},{},{}",
            row.date.format("%Y-%m-%d"),
            csv_field(&row.status),
            row.count
        )?;
    }
    Ok(())
}

fn write_cycles_csv(path: &Path, records: &[CycleRecord]) -> Result<()> {
    let mut out = create_csv(path)?;
    writeln!(
        out,
        "item_key,phase,start_date,end_date,calendar_weeks,active_weeks,excluded_weeks,censored"
    )?;
    for record in records {
        let end = record
            .end
            .map_or_else(String::new, |e| e.format("%Y-%m-%d").to_string());
        writeln!(
            out,
            "{},{},{},{},{:.2},{:.2},{:.2},{}",
            csv_field(&record.item_key),
            record.phase,
            record.start.format("%Y-%m-%d"),
            end,
            record.calendar_weeks,
            record.active_weeks,
            record.excluded_weeks,
            record.censored
        )?;
    }
    Ok(())
}

fn write_summary_csv(path: &Path, rows: &[(Phase, String, BucketStats)]) -> Result<()> {
    let mut out = create_csv(path)?;
    writeln!(
        out,
        "phase,bucket,project_count,outlier_count,\
         calendar_min,calendar_q1,calendar_median,calendar_q3,calendar_max,\
         active_min,active_q1,active_median,active_q3,active_max"
    )?;
    for (phase, bucket, stats) in rows {
        writeln!(
            out,
            "{},{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            phase,
            csv_field(bucket),
            stats.project_count,
            stats.outlier_count,
            stats.calendar.min,
            stats.calendar.q1,
            stats.calendar.median,
            stats.calendar.q3,
            stats.calendar.max,
            stats.active.min,
            stats.active.q1,
            stats.active.median,
            stats.active.q3,
            stats.active.max
        )?;
    }
    Ok(())
}
