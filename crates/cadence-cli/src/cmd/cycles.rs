//! `cad cycles` — per-item phase cycle-time records.

use std::convert::Infallible;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;

use cadence_core::config::PhaseConfig;
use cadence_core::cycles::PhaseCycleCalculator;
use cadence_core::model::CycleRecord;

use crate::cmd::{load_event_logs_reported, resolve_reference_now};
use crate::output::{OutputMode, render};

/// Arguments for `cad cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Changelog export file (JSON).
    #[arg(long, value_name = "PATH")]
    pub events: PathBuf,

    /// Reference date for censored phases (defaults to now).
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    reference_now: DateTime<Utc>,
    records: Vec<CycleRecord>,
}

/// Execute `cad cycles`.
pub fn run_cycles(
    args: &CyclesArgs,
    output: OutputMode,
    config: &PhaseConfig,
) -> anyhow::Result<()> {
    let logs = load_event_logs_reported(&args.events, config, output)?;
    let reference_now = resolve_reference_now(args.as_of);

    let calculator = PhaseCycleCalculator::new(config);
    let records =
        calculator.compute_batch(logs.into_iter().map(Ok::<_, Infallible>), reference_now);

    let payload = CyclesOutput {
        reference_now,
        records,
    };

    render(output, &payload, render_cycles_human)
}

fn render_cycles_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.records.is_empty() {
        writeln!(w, "No phase transitions found.")?;
        return Ok(());
    }

    writeln!(
        w,
        "{:<10} {:<10} {:<12} {:<12} {:>9} {:>8} {:>9}  {}",
        "item", "phase", "start", "end", "calendar", "active", "excluded", "censored"
    )?;
    for record in &payload.records {
        let end = record
            .end
            .map_or_else(|| "-".to_string(), |e| e.format("%Y-%m-%d").to_string());
        writeln!(
            w,
            "{:<10} {:<10} {:<12} {:<12} {:>9.2} {:>8.2} {:>9.2}  {}",
            record.item_key,
            record.phase,
            record.start.format("%Y-%m-%d"),
            end,
            record.calendar_weeks,
            record.active_weeks,
            record.excluded_weeks,
            if record.censored { "yes" } else { "no" }
        )?;
    }

    Ok(())
}
