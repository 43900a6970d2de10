use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::HandlerError;
use crate::state::{Iteration, JobCore, JobErrorEvent, JobStats};

/// Options for [`IntervalJob`].
#[derive(Debug, Clone)]
pub struct IntervalOptions {
    /// Idle time between the end of one run and the start of the next.
    pub interval: Duration,
    /// Run once right after `start()` instead of waiting a full interval.
    pub run_at_start: bool,
}

impl IntervalOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            run_at_start: true,
        }
    }

    pub fn delayed_start(mut self) -> Self {
        self.run_at_start = false;
        self
    }
}

struct Runner {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs a handler repeatedly, sleeping `interval` after each completed run.
///
/// At most one run is in flight at any time. A manual [`trigger`](Self::trigger) that
/// lands while the loop is running the handler is counted as skipped.
pub struct IntervalJob {
    core: Arc<JobCore>,
    options: IntervalOptions,
    runner: Mutex<Option<Runner>>,
}

impl IntervalJob {
    pub fn new<F, Fut>(name: impl Into<String>, options: IntervalOptions, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self {
            core: Arc::new(JobCore::new(name, handler)),
            options,
            runner: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    /// Spawns the timer loop. Returns `false` if the job was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        if !self.core.activate() {
            warn!(job = %self.core.name(), "Job already started");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.core),
            self.options.clone(),
            cancel.clone(),
        ));

        *self.runner.lock().unwrap_or_else(|p| p.into_inner()) = Some(Runner { cancel, handle });
        info!(
            job = %self.core.name(),
            interval_ms = self.options.interval.as_millis() as u64,
            run_at_start = self.options.run_at_start,
            "Job started"
        );
        true
    }

    /// Cancels the pending timer and waits for an in-flight run to finish.
    pub async fn stop(&self) {
        self.core.deactivate();
        let runner = self.runner.lock().unwrap_or_else(|p| p.into_inner()).take();

        if let Some(Runner { cancel, handle }) = runner {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(job = %self.core.name(), error = %e, "Job loop ended abnormally");
            }
            info!(job = %self.core.name(), "Job stopped");
        }
    }

    /// Runs the handler now, outside the timer. Skipped if a run is in flight.
    pub async fn trigger(&self) -> Iteration {
        self.core.run_iteration().await
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<JobErrorEvent> {
        self.core.subscribe()
    }

    pub fn stats(&self) -> JobStats {
        self.core.stats()
    }
}

async fn run_loop(core: Arc<JobCore>, options: IntervalOptions, cancel: CancellationToken) {
    if options.run_at_start {
        core.run_iteration().await;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(options.interval) => {
                if core.run_iteration().await == Iteration::Inactive {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn counting_job(runs: Arc<AtomicUsize>, options: IntervalOptions) -> IntervalJob {
        IntervalJob::new("counting", options, move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_at_start_then_every_interval() {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = counting_job(Arc::clone(&runs), IntervalOptions::every(Duration::from_secs(3)));

        assert!(job.start());
        assert!(!job.start());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        job.stop().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(!job.stats().active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_start_waits_one_interval() {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = counting_job(
            Arc::clone(&runs),
            IntervalOptions::every(Duration::from_secs(5)).delayed_start(),
        );
        job.start();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        job.stop().await;
    }

    #[tokio::test]
    async fn test_slow_handler_never_overlaps() {
        let running = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));

        let job = Arc::new(IntervalJob::new(
            "slow",
            IntervalOptions::every(Duration::from_millis(5)),
            {
                let running = Arc::clone(&running);
                let overlapped = Arc::clone(&overlapped);
                move || {
                    let running = Arc::clone(&running);
                    let overlapped = Arc::clone(&overlapped);
                    async move {
                        if running.swap(true, Ordering::SeqCst) {
                            overlapped.store(true, Ordering::SeqCst);
                        }
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        running.store(false, Ordering::SeqCst);
                        Ok(())
                    }
                }
            },
        ));
        job.start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let before = job.stats();
        assert!(before.working);
        assert_eq!(job.trigger().await, Iteration::Skipped);
        assert_eq!(job.trigger().await, Iteration::Skipped);

        let during = job.stats();
        assert_eq!(during.skipped, 2);
        assert_eq!(during.iterations, before.iterations);

        job.stop().await;
        assert!(!overlapped.load(Ordering::SeqCst));
        assert!(!job.stats().working);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_job() {
        let job = IntervalJob::new(
            "flaky",
            IntervalOptions::every(Duration::from_secs(1)),
            || async { Err::<(), HandlerError>("boom".into()) },
        );
        let mut errors = job.subscribe_errors();
        job.start();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let stats = job.stats();
        assert_eq!(stats.failures, 3);
        assert!(stats.active);
        assert_eq!(errors.recv().await.unwrap().message, "boom");

        job.stop().await;
    }

    #[tokio::test]
    async fn test_trigger_on_stopped_job_is_inactive() {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = counting_job(Arc::clone(&runs), IntervalOptions::every(Duration::from_secs(1)));
        assert_eq!(job.trigger().await, Iteration::Inactive);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
