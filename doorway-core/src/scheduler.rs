//! Background execution
//!
//! [`Scheduler`] runs a [`Job`] on a fixed interval until shutdown is
//! signalled. [`JobRunner`] runs one-off work (queued bulk operations) with
//! bounded retries and a per-attempt timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{CoreError, CoreResult};

/// Recurring unit of work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> CoreResult<()>;
}

fn log_job_error(job: &str, err: &CoreError) {
    if err.is_expected() {
        log::warn!("job_failed job={job} error={err}");
    } else {
        log::error!("job_failed job={job} error={err}");
    }
}

pub struct Scheduler;

impl Scheduler {
    /// Run `job` every `every` until `shutdown` turns `true` or its sender is
    /// dropped.
    ///
    /// Ticks missed while a run is still going are skipped, so runs never
    /// overlap. Shutdown is observed between runs.
    pub fn spawn_recurring(
        job: Arc<dyn Job>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            log::info!(
                "scheduler_started job={} interval_secs={}",
                job.name(),
                every.as_secs()
            );

            while !*shutdown.borrow() {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = job.run().await {
                            log_job_error(job.name(), &e);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            log::info!("scheduler_stopped job={}", job.name());
        })
    }
}

/// Retry policy for one-off background work.
#[derive(Debug, Clone)]
pub struct JobRunner {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(600),
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl JobRunner {
    /// Run `job` until it succeeds, fails with an expected error, or the
    /// retries are used up. A timed out attempt is dropped and counts as failed.
    pub async fn run<T, F, Fut>(&self, name: &str, mut job: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match tokio::time::timeout(self.attempt_timeout, job()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        log::info!("job_succeeded job={name} attempt={attempt}");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => CoreError::Timeout(format!(
                    "{name} attempt {attempt} exceeded {}s",
                    self.attempt_timeout.as_secs()
                )),
            };

            // 参数错误重试也没用
            if err.is_expected() || attempt > self.max_retries {
                log_job_error(name, &err);
                return Err(err);
            }
            log::warn!("job_retry job={name} attempt={attempt} error={err}");
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// [`run`](Self::run) on the tokio runtime; the caller does not wait.
    pub fn spawn<T, F, Fut>(&self, name: impl Into<String>, job: F) -> JoinHandle<CoreResult<T>>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = CoreResult<T>> + Send,
    {
        let runner = self.clone();
        let name = name.into();
        tokio::spawn(async move { runner.run(&name, job).await })
    }
}
