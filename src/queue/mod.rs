//! Durable audit job queue.
//!
//! Jobs are persisted rows delivered at-least-once: a claimed job whose
//! worker dies is returned to the pending pool when its lease expires,
//! so consumers must tolerate re-delivery.

pub mod durable;
pub mod message;

pub use durable::{ClaimedJob, QueueError, QueueOptions, SqliteJobQueue};
pub use message::AuditJobMessage;
