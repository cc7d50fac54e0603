//! `cad snapshots` — weekly cohort tables from reconstructed history.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;

use cadence_core::config::PhaseConfig;
use cadence_report::cohort::{CohortTable, SnapshotAggregator, weekly_dates};

use crate::cmd::{day_start, load_event_logs_reported, resolve_reference_now};
use crate::output::{OutputMode, pretty_section, render};

/// Arguments for `cad snapshots`.
#[derive(Args, Debug)]
pub struct SnapshotsArgs {
    /// Changelog export file (JSON).
    #[arg(long, value_name = "PATH")]
    pub events: PathBuf,

    /// Grid start date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub from: NaiveDate,

    /// Grid end date (defaults to today).
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
}

/// Execute `cad snapshots`.
pub fn run_snapshots(
    args: &SnapshotsArgs,
    output: OutputMode,
    config: &PhaseConfig,
) -> anyhow::Result<()> {
    let logs = load_event_logs_reported(&args.events, config, output)?;
    let to = resolve_reference_now(args.to);
    let dates = weekly_dates(day_start(args.from), to);

    let table = SnapshotAggregator::new(config).aggregate(&logs, &dates);

    render(output, &table, render_snapshots_human)
}

fn render_snapshots_human(table: &CohortTable, w: &mut dyn Write) -> std::io::Result<()> {
    if table.members.is_empty() {
        writeln!(w, "No active items in the requested date range.")?;
        return Ok(());
    }

    pretty_section(w, "Team member cohorts")?;
    writeln!(
        w,
        "{:<12} {:<32} {:>6} {:>9} {:>10} {:>8} {:>8}",
        "date", "member", "total", "on track", "off track", "at risk", "unknown"
    )?;
    for row in &table.members {
        writeln!(
            w,
            "{:<12} {:<32} {:>6} {:>9} {:>10} {:>8} {:>8}",
            row.date.format("%Y-%m-%d"),
            row.member,
            row.total,
            row.health.on_track,
            row.health.off_track,
            row.health.at_risk,
            row.health.unknown
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Health totals")?;
    for row in &table.health {
        writeln!(
            w,
            "{:<12} {:<12} {:>6}",
            row.date.format("%Y-%m-%d"),
            row.health,
            row.count
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Status totals")?;
    for row in &table.status {
        writeln!(
            w,
            "{:<12} {:<28} {:>6}",
            row.date.format("%Y-%m-%d"),
            row.status,
            row.count
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::event::{Event, EventLog, FieldKind};
    use chrono::{TimeZone, Utc};

    #[test]
    fn snapshots_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: SnapshotsArgs,
        }

        let parsed = Wrapper::parse_from([
            "test",
            "--events",
            "export.json",
            "--from",
            "2025-01-01",
            "--to",
            "2025-03-01",
        ]);
        assert_eq!(parsed.args.events, PathBuf::from("export.json"));
        assert_eq!(
            parsed.args.from,
            NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
        );
        assert!(parsed.args.to.is_some());
    }

    #[test]
    fn render_empty_table() {
        let table = CohortTable::default();
        let mut out = Vec::new();

        render_snapshots_human(&table, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("No active items"));
    }

    #[test]
    fn render_lists_members_and_totals() {
        let cfg = PhaseConfig::default();
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).single().expect("ts");
        let log = EventLog::new(
            "HT-1",
            Some(ts),
            vec![
                Event {
                    item_key: "HT-1".to_string(),
                    timestamp: ts,
                    field: FieldKind::Status,
                    from_value: None,
                    to_value: Some("06 Build".to_string()),
                },
                Event {
                    item_key: "HT-1".to_string(),
                    timestamp: ts,
                    field: FieldKind::Assignee,
                    from_value: None,
                    to_value: Some("alice@example.com".to_string()),
                },
            ],
        );
        let cutoff = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).single().expect("ts");
        let table = SnapshotAggregator::new(&cfg).aggregate(&[log], &[cutoff]);

        let mut out = Vec::new();
        render_snapshots_human(&table, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("alice@example.com"));
        assert!(rendered.contains("06 Build"));
        assert!(rendered.contains("Health totals"));
    }
}
