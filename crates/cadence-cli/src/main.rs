#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cadence_core::config::load_config;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cadence: changelog-replay analytics for issue trackers",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a cadence config TOML (built-in defaults when omitted).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment, and TTY state.
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Reporting",
        about = "Weekly cohort tables from reconstructed history",
        long_about = "Reconstruct every item's state over a weekly grid of dates and count \
                      active items per team member, health class, and workflow status.",
        after_help = "EXAMPLES:\n    # Cohorts from January to today\n    cad snapshots --events export.json --from 2025-01-01\n\n    # Emit machine-readable output\n    cad snapshots --events export.json --from 2025-01-01 --json"
    )]
    Snapshots(cmd::snapshots::SnapshotsArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Per-item phase cycle-time records",
        long_about = "Compute discovery and build phase durations per item from the status \
                      changelog, distinguishing calendar from active time and marking \
                      unfinished phases as censored.",
        after_help = "EXAMPLES:\n    # Cycle records against the current date\n    cad cycles --events export.json\n\n    # Reproducible run pinned to a reference date\n    cad cycles --events export.json --as-of 2025-07-01 --json"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Cycle-time distribution per phase per quarter",
        long_about = "Filter outliers and compute min/quartile/max distribution statistics \
                      of phase durations, bucketed by the calendar quarter each phase ended in.",
        after_help = "EXAMPLES:\n    # Quarterly distribution summary\n    cad summary --events export.json\n\n    # Widen the outlier window\n    cad summary --events export.json --min-weeks 0 --max-weeks 52"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Interoperability",
        about = "Write the CSV artifact set",
        long_about = "Run the full pipeline and write cohort tables, cycle records, and the \
                      quarterly summary as CSV files for dashboard consumption.",
        after_help = "EXAMPLES:\n    # Everything into ./reports\n    cad export --events export.json --from 2025-01-01 --out reports"
    )]
    Export(cmd::export::ExportArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    let format = env::var("CADENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Snapshots(args) => cmd::snapshots::run_snapshots(args, output, &config),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, output, &config),
        Commands::Summary(args) => cmd::summary::run_summary(args, output, &config),
        Commands::Export(args) => cmd::export::run_export(args, output, &config),
    }
}
