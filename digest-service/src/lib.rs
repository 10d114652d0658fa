//! Runs the seven-stage digest pipeline once, or daily on a schedule.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{derive_status, fail_before_start, Orchestrator, RunOutcome, Stage, StageTransition};
pub use scheduler::{duration_until, run_daily, run_log_name};
