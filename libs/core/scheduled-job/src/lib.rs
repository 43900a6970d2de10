//! Background jobs with single-flight execution
//!
//! ```text
//! IntervalJob ──► sleep(interval) after each run ─┐
//! CronJob ──────► tokio-cron-scheduler tick ──────┤
//! trigger() ──────────────────────────────────────┤
//!                                                 ▼
//!                                   JobCore::run_iteration
//!                                     ├─ inactive      → Inactive
//!                                     ├─ still working → skipped += 1
//!                                     └─ handler()     → iterations += 1
//!                                            └─ Err    → failures += 1, JobErrorEvent
//! ```
//!
//! A failing handler never stops its job. Failures are logged, counted and
//! broadcast to [`subscribe_errors`](IntervalJob::subscribe_errors) receivers.

pub mod cron;
pub mod error;
pub mod interval;
mod state;

pub use cron::CronJob;
pub use error::{HandlerError, JobError, JobResult};
pub use interval::{IntervalJob, IntervalOptions};
pub use state::{Iteration, JobErrorEvent, JobStats};
