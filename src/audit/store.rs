//! Persistent store for audit records.
//!
//! The store exposes a small create/update/find contract behind the
//! [`AuditStore`] trait so the processor and tests can substitute fakes.
//! The SQLite implementation creates its schema idempotently on connect.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

use super::record::{AuditRecord, AuditStatus, ANONYMOUS_USER_ID};

/// Error type for audit store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the given id.
    #[error("audit {0} not found")]
    NotFound(String),

    /// Underlying database failure.
    #[error("audit store database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored status value could not be decoded.
    #[error("corrupt audit record {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// Create/update/find contract for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Create a new PENDING record for the given URL.
    async fn create(&self, url: &str) -> Result<AuditRecord, StoreError>;

    /// Transition a record to the given status, touching `updated_at`.
    async fn update_status(&self, id: &str, status: AuditStatus) -> Result<AuditRecord, StoreError>;

    /// Look up one record by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<AuditRecord>, StoreError>;

    /// All records, newest first.
    async fn find_many(&self) -> Result<Vec<AuditRecord>, StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audits (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    url        TEXT NOT NULL,
    status     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audits_created_at ON audits (created_at);
"#;

/// SQLite-backed [`AuditStore`].
#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    /// Connect to the database and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = crate::db::connect_pool(url).await?;
        Self::with_pool(pool).await
    }

    /// Build a store over an existing pool, ensuring the schema exists.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Access to the underlying pool, mainly for tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AuditRecord, StoreError> {
        let id: String = row.get("id");
        let status_text: String = row.get("status");
        let status = status_text
            .parse::<AuditStatus>()
            .map_err(|message| StoreError::Corrupt {
                id: id.clone(),
                message,
            })?;

        Ok(AuditRecord {
            id,
            user_id: row.get("user_id"),
            url: row.get("url"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn create(&self, url: &str) -> Result<AuditRecord, StoreError> {
        let record = AuditRecord {
            id: Uuid::new_v4().to_string(),
            user_id: ANONYMOUS_USER_ID.to_string(),
            url: url.to_string(),
            status: AuditStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO audits (id, user_id, url, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.url)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_status(&self, id: &str, status: AuditStatus) -> Result<AuditRecord, StoreError> {
        let updated = sqlx::query(
            "UPDATE audits SET status = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AuditRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM audits WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn find_many(&self) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM audits ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::record_from_row).collect()
    }
}
