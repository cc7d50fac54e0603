//! cadence-core library.
//!
//! Replays issue-tracker change histories into point-in-time snapshots and
//! phase-level cycle-time records. Everything here is a pure batch
//! transform: the same input always produces the same output.
//!
//! # Conventions
//!
//! - **Errors**: explicit error enums at parse seams; `anyhow::Result` with
//!   context at config-loading seams.
//! - **Logging**: `tracing` macros (`warn!` for skipped events and
//!   data-quality diagnostics, `debug!` for batch progress).
//! - **Configuration**: one [`config::PhaseConfig`] value passed explicitly
//!   into every constructor that needs it; no process-wide state.

pub mod config;
pub mod cycles;
pub mod error;
pub mod event;
pub mod model;
pub mod replay;

pub use config::PhaseConfig;
pub use cycles::PhaseCycleCalculator;
pub use event::EventLog;
pub use model::{CycleRecord, Health, Phase, Snapshot};
pub use replay::StateReconstructor;
