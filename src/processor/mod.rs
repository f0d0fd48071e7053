//! Audit job processor: owns the status state machine for one audit id
//! per invocation and orchestrates the two engines.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::audit::{AuditStatus, AuditStore, StoreError};
use crate::scoring::AuditScore;
use crate::scraper::schema::ScrapeResult;

/// Error from one of the external-process-driving engines, always
/// carrying the target URL and the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to scrape website {url}: {source}")]
    Scrape {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to audit page quality for {url}: {source}")]
    Audit {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EngineError {
    pub fn scrape(url: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Scrape {
            url: url.into(),
            source,
        }
    }

    pub fn audit(url: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Audit {
            url: url.into(),
            source,
        }
    }
}

/// Structural/UX extraction seam; implemented by the website scraper
/// and by test fakes.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, EngineError>;
}

/// Page-quality scoring seam.
#[async_trait]
pub trait PageAuditor: Send + Sync {
    async fn audit(&self, url: &str) -> Result<AuditScore, EngineError>;
}

/// Error from processing one audit job.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The job referenced an audit record that does not exist.
    #[error("audit {0} not found")]
    NotFound(String),

    /// The record could not be loaded.
    #[error("failed to load audit {audit_id}: {source}")]
    Load {
        audit_id: String,
        #[source]
        source: StoreError,
    },

    /// A primary status update failed; the job aborts immediately.
    #[error("failed to set audit {audit_id} to {status}: {source}")]
    Transition {
        audit_id: String,
        status: AuditStatus,
        #[source]
        source: StoreError,
    },

    /// One of the engines failed; the record was marked FAILED (or the
    /// attempt to do so was logged).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ProcessError {
    /// Whether the queue should redeliver the job. A missing record will
    /// not appear by retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

/// Outcome of the secondary FAILED-status write.
///
/// A failing write is logged, never escalated, so the original engine
/// error is not masked. When both writes fail the record stays in
/// PROCESSING.
#[derive(Debug)]
pub struct FailureMark {
    pub updated: bool,
    pub log_error: Option<StoreError>,
}

/// Everything one successful processing attempt produced in memory.
///
/// Handed to the caller for storage/reporting by collaborators; only
/// the status transition and the screenshot file persist here.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub scrape: ScrapeResult,
    pub score: AuditScore,
}

/// Drives `PENDING → PROCESSING → {COMPLETED, FAILED}` for one audit id
/// per invocation.
pub struct AuditProcessor {
    store: Arc<dyn AuditStore>,
    scraper: Arc<dyn Scraper>,
    auditor: Arc<dyn PageAuditor>,
}

impl AuditProcessor {
    pub fn new(
        store: Arc<dyn AuditStore>,
        scraper: Arc<dyn Scraper>,
        auditor: Arc<dyn PageAuditor>,
    ) -> Self {
        Self {
            store,
            scraper,
            auditor,
        }
    }

    /// Process one audit job.
    ///
    /// Re-delivery is not special-cased: processing an already-COMPLETED
    /// id re-runs both engines (new screenshot, new scores) and
    /// re-writes the same terminal status. Side effects only become
    /// visible when the final record is read, so there is no
    /// idempotency guard.
    pub async fn process(&self, audit_id: &str) -> Result<AuditOutcome, ProcessError> {
        let record = self
            .store
            .find_by_id(audit_id)
            .await
            .map_err(|source| ProcessError::Load {
                audit_id: audit_id.to_string(),
                source,
            })?
            .ok_or_else(|| ProcessError::NotFound(audit_id.to_string()))?;

        // Failed-to-start: a PROCESSING write failure aborts before any
        // engine runs.
        self.transition(audit_id, AuditStatus::Processing).await?;

        // The engines have no ordering dependency; run them
        // concurrently. Each launches its own browser process.
        let work = tokio::try_join!(
            self.scraper.scrape(&record.url),
            self.auditor.audit(&record.url)
        );

        match work {
            Ok((scrape, score)) => {
                self.transition(audit_id, AuditStatus::Completed).await?;
                info!(
                    audit_id = %audit_id,
                    url = %record.url,
                    performance = score.performance,
                    accessibility = score.accessibility,
                    seo = score.seo,
                    "audit completed"
                );
                Ok(AuditOutcome { scrape, score })
            }
            Err(engine_error) => {
                let mark = self.mark_failed(audit_id).await;
                if let Some(log_error) = &mark.log_error {
                    error!(
                        audit_id = %audit_id,
                        error = %log_error,
                        "failed to record FAILED status; record may be stuck in PROCESSING"
                    );
                }
                Err(ProcessError::Engine(engine_error))
            }
        }
    }

    async fn transition(
        &self,
        audit_id: &str,
        status: AuditStatus,
    ) -> Result<(), ProcessError> {
        self.store
            .update_status(audit_id, status)
            .await
            .map(|_| ())
            .map_err(|source| ProcessError::Transition {
                audit_id: audit_id.to_string(),
                status,
                source,
            })
    }

    /// Attempt the secondary FAILED write; never escalates.
    async fn mark_failed(&self, audit_id: &str) -> FailureMark {
        match self.store.update_status(audit_id, AuditStatus::Failed).await {
            Ok(_) => FailureMark {
                updated: true,
                log_error: None,
            },
            Err(e) => FailureMark {
                updated: false,
                log_error: Some(e),
            },
        }
    }
}
