//! cadence-report library.
//!
//! Consumes the cadence-core replay outputs and turns them into reporting
//! tables: cohort counts over a grid of snapshot dates, and cycle-time
//! distribution summaries per reporting bucket.
//!
//! # Conventions
//!
//! - **Errors**: aggregation is infallible over already-parsed inputs;
//!   data-quality oddities are logged with `tracing`, never raised.
//! - **Logging**: `tracing` macros.

pub mod cohort;
pub mod stats;

pub use cohort::{CohortTable, SnapshotAggregator, weekly_dates};
pub use stats::{BucketStats, DurationStats, quarter_bucket, quarter_key, summarize};
