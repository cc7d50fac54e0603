//! Command handlers for the `cad` CLI.

pub mod cycles;
pub mod export;
pub mod snapshots;
pub mod summary;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::Path;

use cadence_core::config::PhaseConfig;
use cadence_core::error::ErrorCode;
use cadence_core::event::{EventLog, parser};

use crate::output::{CliError, OutputMode, render_error};

/// Load and parse a changelog export file into per-item event logs.
pub fn load_event_logs(path: &Path, config: &PhaseConfig) -> Result<Vec<EventLog>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read changelog export {}", path.display()))?;

    let logs = parser::parse_export(&content, &config.fields)
        .with_context(|| format!("failed to parse changelog export {}", path.display()))?;

    tracing::debug!(items = logs.len(), "loaded changelog export");
    Ok(logs)
}

/// Load event logs, rendering a structured error before failing the command.
pub fn load_event_logs_reported(
    path: &Path,
    config: &PhaseConfig,
    output: OutputMode,
) -> Result<Vec<EventLog>> {
    match load_event_logs(path, config) {
        Ok(logs) => Ok(logs),
        Err(e) => {
            render_error(
                output,
                &CliError::with_details(
                    format!("{e:#}"),
                    "pass --events a JSON changelog export produced by the tracker client",
                    ErrorCode::ExportParseError.code(),
                ),
            )?;
            Err(e)
        }
    }
}

/// Midnight UTC at the start of a date.
#[must_use]
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Resolve an optional `--as-of` date to a reference instant, defaulting to
/// the current time.
#[must_use]
pub fn resolve_reference_now(as_of: Option<NaiveDate>) -> DateTime<Utc> {
    as_of.map_or_else(Utc::now, day_start)
}

/// Minimal CSV field escaping: quote when the value contains a comma,
/// quote, or newline.
#[must_use]
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
