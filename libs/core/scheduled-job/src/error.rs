use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Error type a job handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    #[error("Job '{0}' is already running")]
    AlreadyStarted(String),
}

pub type JobResult<T> = Result<T, JobError>;
