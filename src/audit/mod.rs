//! Audit records and their persistent store.
//!
//! An audit is one evaluation run of a URL. Records move through a
//! monotonic status state machine (`PENDING → PROCESSING → COMPLETED |
//! FAILED`) driven exclusively by the processor.

pub mod record;
pub mod store;

pub use record::{AuditRecord, AuditStatus, ANONYMOUS_USER_ID};
pub use store::{AuditStore, SqliteAuditStore, StoreError};
