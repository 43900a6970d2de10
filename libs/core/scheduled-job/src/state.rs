use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use metrics::counter;
use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::error::HandlerError;

type HandlerFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Emitted on the error channel every time a handler run fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobErrorEvent {
    pub job: String,
    pub message: String,
    pub failures: u64,
    pub at: DateTime<Utc>,
}

/// Point-in-time copy of a job's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub name: String,
    pub active: bool,
    pub working: bool,
    pub failures: u64,
    pub iterations: u64,
    pub skipped: u64,
    pub last_started_at: Option<DateTime<Utc>>,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    Completed,
    Failed,
    /// The previous run was still in flight.
    Skipped,
    /// The job is stopped.
    Inactive,
}

/// Shared by every scheduling variant: the handler plus the single-flight state.
pub(crate) struct JobCore {
    name: String,
    handler: HandlerFn,
    active: AtomicBool,
    working: AtomicBool,
    failures: AtomicU64,
    iterations: AtomicU64,
    skipped: AtomicU64,
    last_started_at: Mutex<Option<DateTime<Utc>>>,
    errors: broadcast::Sender<JobErrorEvent>,
}

/// Clears the working flag even if the handler future is dropped mid-run.
struct WorkingGuard<'a>(&'a AtomicBool);

impl Drop for WorkingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl JobCore {
    pub(crate) fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            handler: Box::new(move || handler().boxed()),
            active: AtomicBool::new(false),
            working: AtomicBool::new(false),
            failures: AtomicU64::new(0),
            iterations: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            last_started_at: Mutex::new(None),
            errors,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Returns `false` when the job was already active.
    pub(crate) fn activate(&self) -> bool {
        !self.active.swap(true, Ordering::AcqRel)
    }

    /// Returns `false` when the job was already stopped.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<JobErrorEvent> {
        self.errors.subscribe()
    }

    pub(crate) async fn run_iteration(&self) -> Iteration {
        if !self.is_active() {
            debug!(job = %self.name, "Tick on inactive job ignored");
            return Iteration::Inactive;
        }

        if self
            .working
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
            counter!("scheduled_job_skipped_total", "job" => self.name.clone()).increment(1);
            warn!(job = %self.name, skipped, "Previous run still in progress, skipping");
            return Iteration::Skipped;
        }
        let _working = WorkingGuard(&self.working);

        self.iterations.fetch_add(1, Ordering::Relaxed);
        *self
            .last_started_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Utc::now());

        match (self.handler)().await {
            Ok(()) => {
                counter!("scheduled_job_runs_total", "job" => self.name.clone(), "outcome" => "ok")
                    .increment(1);
                Iteration::Completed
            }
            Err(e) => {
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                counter!("scheduled_job_runs_total", "job" => self.name.clone(), "outcome" => "error")
                    .increment(1);
                error!(job = %self.name, failures, error = %e, "Job run failed");

                // No subscribers is fine
                let _ = self.errors.send(JobErrorEvent {
                    job: self.name.clone(),
                    message: e.to_string(),
                    failures,
                    at: Utc::now(),
                });
                Iteration::Failed
            }
        }
    }

    pub(crate) fn stats(&self) -> JobStats {
        JobStats {
            name: self.name.clone(),
            active: self.is_active(),
            working: self.working.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            last_started_at: *self
                .last_started_at
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn failing_core() -> JobCore {
        JobCore::new("failing", || async { Err::<(), HandlerError>("smtp down".into()) })
    }

    #[tokio::test]
    async fn test_inactive_core_does_not_run() {
        let core = JobCore::new("idle", || async { Ok(()) });
        assert_eq!(core.run_iteration().await, Iteration::Inactive);
        assert_eq!(core.stats().iterations, 0);
    }

    #[tokio::test]
    async fn test_failures_are_counted_and_broadcast() {
        let core = failing_core();
        let mut errors = core.subscribe();
        core.activate();

        assert_eq!(core.run_iteration().await, Iteration::Failed);
        assert_eq!(core.run_iteration().await, Iteration::Failed);

        let event = errors.recv().await.unwrap();
        assert_eq!(event.job, "failing");
        assert_eq!(event.message, "smtp down");
        assert_eq!(event.failures, 1);

        let stats = core.stats();
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.iterations, 2);
        assert!(stats.active);
        assert!(!stats.working);
        assert!(stats.last_started_at.is_some());
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let core = Arc::new(JobCore::new("slow", || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }));
        core.activate();

        let first = tokio::spawn({
            let core = Arc::clone(&core);
            async move { core.run_iteration().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(core.run_iteration().await, Iteration::Skipped);
        assert_eq!(first.await.unwrap(), Iteration::Completed);

        let stats = core.stats();
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.skipped, 1);
        assert!(!stats.working);
    }
}
