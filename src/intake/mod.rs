//! Audit intake: validates URLs, creates PENDING records and enqueues
//! the matching job in one call.

use std::sync::Arc;

use tracing::info;

use crate::audit::{AuditRecord, AuditStore, StoreError};
use crate::queue::{AuditJobMessage, QueueError, SqliteJobQueue};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("audit URL must not be empty")]
    EmptyUrl,

    #[error("invalid audit URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to persist audit: {0}")]
    Store(#[from] StoreError),

    /// The record exists but its job could not be enqueued; the audit
    /// stays PENDING until resubmitted.
    #[error("failed to enqueue audit job: {0}")]
    Queue(#[from] QueueError),
}

/// Front door for new audit requests.
pub struct AuditIntake {
    store: Arc<dyn AuditStore>,
    queue: Arc<SqliteJobQueue>,
}

impl AuditIntake {
    pub fn new(store: Arc<dyn AuditStore>, queue: Arc<SqliteJobQueue>) -> Self {
        Self { store, queue }
    }

    /// Validate the URL, create the PENDING record, enqueue its job.
    pub async fn create_audit(&self, url: &str) -> Result<AuditRecord, IntakeError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(IntakeError::EmptyUrl);
        }
        let parsed = url::Url::parse(url)?;

        let record = self.store.create(parsed.as_str()).await?;
        self.queue
            .submit(&AuditJobMessage::new(&record.id))
            .await?;

        info!(audit_id = %record.id, url = %record.url, "audit accepted");
        Ok(record)
    }

    pub async fn get_audit(&self, id: &str) -> Result<Option<AuditRecord>, IntakeError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn list_audits(&self) -> Result<Vec<AuditRecord>, IntakeError> {
        Ok(self.store.find_many().await?)
    }
}
