//! Long-lived audit worker.
//!
//! Polls the durable queue, processes claimed jobs concurrently up to a
//! fixed bound, and settles every delivery (ack, retry or reject). A
//! per-job failure never tears the loop down; only cancellation stops
//! it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::processor::AuditProcessor;
use crate::queue::{ClaimedJob, SqliteJobQueue};

/// Tuning for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Identity recorded on claimed leases.
    pub worker_id: String,
    /// Maximum jobs processed concurrently per poll cycle.
    pub concurrency: usize,
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", Uuid::new_v4()),
            concurrency: 2,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Queue-driven worker wrapping one [`AuditProcessor`].
pub struct AuditWorker {
    queue: Arc<SqliteJobQueue>,
    processor: Arc<AuditProcessor>,
    options: WorkerOptions,
}

impl AuditWorker {
    pub fn new(
        queue: Arc<SqliteJobQueue>,
        processor: Arc<AuditProcessor>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            queue,
            processor,
            options,
        }
    }

    /// Run until the token is cancelled.
    ///
    /// Jobs already claimed when cancellation arrives finish their
    /// current batch; nothing new is claimed afterwards.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            worker_id = %self.options.worker_id,
            concurrency = self.options.concurrency,
            "audit worker started"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if let Err(e) = self.queue.release_expired().await {
                error!("failed to release expired leases: {e}");
            }

            let claimed = match self
                .queue
                .claim(&self.options.worker_id, self.options.concurrency as i64)
                .await
            {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!("failed to claim jobs: {e}");
                    Vec::new()
                }
            };

            if claimed.is_empty() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.options.poll_interval) => {}
                }
                continue;
            }

            debug!(count = claimed.len(), "claimed audit jobs");
            join_all(claimed.into_iter().map(|job| self.handle_job(job))).await;
        }

        info!(worker_id = %self.options.worker_id, "audit worker stopped");
    }

    /// Settle one delivery. Errors stay inside this job: the processor's
    /// outcome decides ack/retry/reject, and settlement failures are
    /// logged rather than propagated.
    async fn handle_job(&self, job: ClaimedJob) {
        let message = match job.message() {
            Ok(message) => message,
            Err(e) => {
                warn!(job_id = %job.id, "rejecting undecodable job payload: {e}");
                self.settle_reject(&job.id, &e.to_string()).await;
                return;
            }
        };

        if !message.is_valid() {
            warn!(job_id = %job.id, "rejecting job with blank audit id");
            self.settle_reject(&job.id, "blank audit id").await;
            return;
        }

        info!(
            job_id = %job.id,
            audit_id = %message.audit_id,
            attempt = job.attempts + 1,
            "processing audit job"
        );

        match self.processor.process(&message.audit_id).await {
            Ok(outcome) => {
                info!(
                    job_id = %job.id,
                    audit_id = %message.audit_id,
                    screenshot = %outcome.scrape.screenshot_path.display(),
                    "audit job succeeded"
                );
                if let Err(e) = self.queue.ack(&job.id).await {
                    error!(job_id = %job.id, "failed to ack completed job: {e}");
                }
            }
            Err(process_error) if process_error.is_retryable() => {
                warn!(
                    job_id = %job.id,
                    audit_id = %message.audit_id,
                    "audit job failed, scheduling retry: {process_error}"
                );
                if let Err(e) = self.queue.retry(&job.id, &process_error.to_string()).await {
                    error!(job_id = %job.id, "failed to schedule retry: {e}");
                }
            }
            Err(process_error) => {
                warn!(
                    job_id = %job.id,
                    audit_id = %message.audit_id,
                    "rejecting unprocessable audit job: {process_error}"
                );
                self.settle_reject(&job.id, &process_error.to_string()).await;
            }
        }
    }

    async fn settle_reject(&self, job_id: &str, reason: &str) {
        if let Err(e) = self.queue.reject(job_id, reason).await {
            error!(job_id = %job_id, "failed to reject job: {e}");
        }
    }
}
