//! SQLite-backed durable job queue with lease-based redelivery.

use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use super::message::AuditJobMessage;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue transport endpoint is not configured.
    #[error("queue endpoint is not configured")]
    Configuration,

    /// Payload (de)serialization failed.
    #[error("invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Underlying database failure.
    #[error("queue database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Operation referenced a delivery that does not exist.
    #[error("job {0} not found")]
    NotFound(String),
}

/// Tuning knobs for delivery and retry behavior.
///
/// The retry policy is deliberately generic: a fixed re-delivery delay
/// and an attempt cap, nothing score-aware.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Attempts before a delivery is dead-lettered.
    pub max_attempts: i64,
    /// Delay before a failed delivery becomes claimable again.
    pub retry_delay: Duration,
    /// How long a claimed job stays leased before redelivery.
    pub lease_duration: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            lease_duration: Duration::from_secs(120),
        }
    }
}

/// A delivery claimed by a worker, holding its raw payload.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    /// Queue-side delivery id (not the audit id).
    pub id: String,
    /// Attempts consumed before this claim.
    pub attempts: i64,
    payload: String,
}

impl ClaimedJob {
    /// Deserialize the transported message.
    pub fn message(&self) -> Result<AuditJobMessage, QueueError> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_jobs (
    id               TEXT PRIMARY KEY,
    payload          TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    attempts         INTEGER NOT NULL DEFAULT 0,
    last_error       TEXT,
    available_at     TEXT NOT NULL,
    lease_expires_at TEXT,
    worker_id        TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_jobs_ready ON audit_jobs (status, available_at);
"#;

/// SQLite-backed durable queue for [`AuditJobMessage`] deliveries.
///
/// Delivery states: `pending` (claimable once `available_at` passes),
/// `running` (leased to a worker), `succeeded`, `exhausted` (retries
/// spent), `rejected` (malformed, never retried).
#[derive(Debug, Clone)]
pub struct SqliteJobQueue {
    pool: SqlitePool,
    options: QueueOptions,
}

impl SqliteJobQueue {
    /// Connect to the queue endpoint and ensure the schema exists.
    ///
    /// An empty endpoint string is a configuration error, surfaced here
    /// rather than per-submission.
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        Self::connect_with(url, QueueOptions::default()).await
    }

    /// Connect with explicit delivery/retry options.
    pub async fn connect_with(url: &str, options: QueueOptions) -> Result<Self, QueueError> {
        if url.trim().is_empty() {
            return Err(QueueError::Configuration);
        }
        let pool = crate::db::connect_pool(url).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool, options })
    }

    /// Durably enqueue one delivery; returns the delivery id.
    pub async fn submit(&self, message: &AuditJobMessage) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(message)?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO audit_jobs (id, payload, status, available_at, created_at, updated_at) \
             VALUES (?1, ?2, 'pending', ?3, ?3, ?3)",
        )
        .bind(&id)
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(job_id = %id, audit_id = %message.audit_id, "audit job enqueued");
        Ok(id)
    }

    /// Atomically claim up to `limit` due jobs for this worker.
    ///
    /// Claimed jobs carry a lease; a worker that never acks or fails
    /// them hands them back via [`Self::release_expired`].
    pub async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedJob>, QueueError> {
        let now = Utc::now();
        let lease_expires = now
            + chrono::Duration::milliseconds(self.options.lease_duration.as_millis() as i64);

        let rows = sqlx::query(
            "UPDATE audit_jobs \
             SET status = 'running', worker_id = ?1, lease_expires_at = ?2, updated_at = ?3 \
             WHERE id IN ( \
                 SELECT id FROM audit_jobs \
                 WHERE status = 'pending' AND available_at <= ?3 \
                 ORDER BY created_at \
                 LIMIT ?4 \
             ) \
             RETURNING id, payload, attempts",
        )
        .bind(worker_id)
        .bind(lease_expires)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ClaimedJob {
                id: row.get("id"),
                attempts: row.get("attempts"),
                payload: row.get("payload"),
            })
            .collect())
    }

    /// Acknowledge successful completion; the delivery becomes terminal.
    pub async fn ack(&self, job_id: &str) -> Result<(), QueueError> {
        let result = sqlx::query(
            "UPDATE audit_jobs SET status = 'succeeded', lease_expires_at = NULL, updated_at = ?1 \
             WHERE id = ?2",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    /// Record a retryable failure.
    ///
    /// Requeues with the configured delay while attempts remain, else
    /// marks the delivery `exhausted`.
    pub async fn retry(&self, job_id: &str, error: &str) -> Result<(), QueueError> {
        let row = sqlx::query("SELECT attempts FROM audit_jobs WHERE id = ?1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| QueueError::NotFound(job_id.to_string()))?;

        let attempts: i64 = row.get("attempts");
        let attempts = attempts + 1;
        let now = Utc::now();

        if attempts >= self.options.max_attempts {
            sqlx::query(
                "UPDATE audit_jobs \
                 SET status = 'exhausted', attempts = ?1, last_error = ?2, \
                     lease_expires_at = NULL, worker_id = NULL, updated_at = ?3 \
                 WHERE id = ?4",
            )
            .bind(attempts)
            .bind(error)
            .bind(now)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

            info!(job_id = %job_id, attempts, "audit job exhausted its retries");
        } else {
            let available_at = now
                + chrono::Duration::milliseconds(self.options.retry_delay.as_millis() as i64);

            sqlx::query(
                "UPDATE audit_jobs \
                 SET status = 'pending', attempts = ?1, last_error = ?2, available_at = ?3, \
                     lease_expires_at = NULL, worker_id = NULL, updated_at = ?4 \
                 WHERE id = ?5",
            )
            .bind(attempts)
            .bind(error)
            .bind(available_at)
            .bind(now)
            .bind(job_id)
            .execute(&self.pool)
            .await?;

            debug!(job_id = %job_id, attempts, "audit job requeued for retry");
        }

        Ok(())
    }

    /// Terminally fail a malformed delivery without retrying it.
    pub async fn reject(&self, job_id: &str, reason: &str) -> Result<(), QueueError> {
        let result = sqlx::query(
            "UPDATE audit_jobs \
             SET status = 'rejected', last_error = ?1, lease_expires_at = NULL, updated_at = ?2 \
             WHERE id = ?3",
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(job_id.to_string()));
        }
        Ok(())
    }

    /// Return lease-expired running jobs to the pending pool.
    ///
    /// This is the crash-recovery path behind at-least-once delivery.
    pub async fn release_expired(&self) -> Result<u64, QueueError> {
        let result = sqlx::query(
            "UPDATE audit_jobs \
             SET status = 'pending', worker_id = NULL, lease_expires_at = NULL, updated_at = ?1 \
             WHERE status = 'running' AND lease_expires_at IS NOT NULL AND lease_expires_at <= ?1",
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let released = result.rows_affected();
        if released > 0 {
            info!(released, "released expired job leases for redelivery");
        }
        Ok(released)
    }

    /// Current delivery state of a job, mainly for tests and operators.
    pub async fn job_status(&self, job_id: &str) -> Result<Option<String>, QueueError> {
        let row = sqlx::query("SELECT status FROM audit_jobs WHERE id = ?1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("status")))
    }
}
