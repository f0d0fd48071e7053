//! sitepulse: asynchronous website-audit pipeline.
//!
//! An audit request becomes a PENDING record plus a durable queue job;
//! a long-lived worker claims jobs and drives each through a scrape
//! (structure, UX signals, screenshot) and a page-quality audit
//! (performance, accessibility, SEO scores) to a terminal status.

pub mod audit;
pub mod browser;
pub mod config;
pub(crate) mod db;
pub mod intake;
pub mod processor;
pub mod queue;
pub mod scoring;
pub mod scraper;
pub mod worker;

pub use audit::{AuditRecord, AuditStatus, AuditStore, SqliteAuditStore, StoreError};
pub use config::WorkerConfig;
pub use intake::{AuditIntake, IntakeError};
pub use processor::{AuditOutcome, AuditProcessor, EngineError, PageAuditor, ProcessError, Scraper};
pub use queue::{AuditJobMessage, ClaimedJob, QueueError, QueueOptions, SqliteJobQueue};
pub use scoring::{AuditEngineConfig, AuditScore, PageAuditEngine};
pub use scraper::schema::ScrapeResult;
pub use scraper::{ScraperConfig, WebsiteScraper};
pub use worker::{AuditWorker, WorkerOptions};
