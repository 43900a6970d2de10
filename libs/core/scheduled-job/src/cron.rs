use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::error::{HandlerError, JobError, JobResult};
use crate::state::{Iteration, JobCore, JobErrorEvent, JobStats};

/// Runs a handler on a cron schedule (`sec min hour day month weekday`).
///
/// Cron ticks fire on wall-clock time, so a slow run makes the next tick skip.
pub struct CronJob {
    core: Arc<JobCore>,
    schedule: String,
    scheduler: Mutex<Option<JobScheduler>>,
}

impl CronJob {
    pub fn new<F, Fut>(name: impl Into<String>, schedule: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self {
            core: Arc::new(JobCore::new(name, handler)),
            schedule: schedule.into(),
            scheduler: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub async fn start(&self) -> JobResult<()> {
        let mut slot = self.scheduler.lock().await;
        if slot.is_some() {
            return Err(JobError::AlreadyStarted(self.core.name().to_string()));
        }

        let sched = JobScheduler::new().await?;
        let core = Arc::clone(&self.core);
        let job = Job::new_async(self.schedule.as_str(), move |_uuid, _l| {
            let core = Arc::clone(&core);
            Box::pin(async move {
                core.run_iteration().await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        self.core.activate();
        *slot = Some(sched);
        info!(job = %self.core.name(), schedule = %self.schedule, "Cron job started");
        Ok(())
    }

    /// Shuts the scheduler down. Runs already in flight complete on their own.
    pub async fn stop(&self) -> JobResult<()> {
        self.core.deactivate();
        if let Some(mut sched) = self.scheduler.lock().await.take() {
            sched.shutdown().await?;
            info!(job = %self.core.name(), "Cron job stopped");
        }
        Ok(())
    }

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
