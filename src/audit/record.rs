//! The audit record and its status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder owner for audits created without an authenticated user.
pub const ANONYMOUS_USER_ID: &str = "anonymous";

/// Processing status of an audit record.
///
/// Transitions form a DAG and never move backward:
/// `Pending → Processing → { Completed, Failed }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AuditStatus {
    /// Canonical TEXT encoding used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Completed and Failed are terminal for a processing attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown audit status: {other}")),
        }
    }
}

/// One evaluation run of a URL.
///
/// Note: there is no failure-reason field. A FAILED record carries no
/// explanation of what went wrong; the reason surfaces only in worker
/// logs. Extending the schema with an error-message column is a
/// deliberate storage-contract change, not something this type grows on
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Opaque unique identifier, generated at creation, immutable.
    pub id: String,
    /// Placeholder owner; always [`ANONYMOUS_USER_ID`] for now.
    pub user_id: String,
    /// Target URL, immutable after creation.
    pub url: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    /// Changes on every status transition.
    pub updated_at: DateTime<Utc>,
}
