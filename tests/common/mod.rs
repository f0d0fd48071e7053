//! Shared fakes for pipeline tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use sitepulse::audit::ANONYMOUS_USER_ID;
use sitepulse::scraper::schema::{NavigationSummary, PageMetadata, ScrapeResult};
use sitepulse::{
    AuditRecord, AuditScore, AuditStatus, AuditStore, EngineError, PageAuditor, Scraper,
    StoreError,
};

pub fn sample_scrape_result() -> ScrapeResult {
    ScrapeResult {
        metadata: PageMetadata {
            title: Some("Example".into()),
            description: Some("An example page".into()),
        },
        headings: Vec::new(),
        ctas: Vec::new(),
        forms: Vec::new(),
        navigation: NavigationSummary { link_count: 4 },
        screenshot_path: PathBuf::from("screenshots/screenshot-1.png"),
    }
}

pub fn sample_score() -> AuditScore {
    AuditScore {
        performance: 86,
        accessibility: 100,
        seo: 80,
    }
}

/// Scraper fake with a configurable failure switch.
pub struct FakeScraper {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeScraper {
    pub fn succeeding() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(EngineError::scrape(url, anyhow::anyhow!("browser crashed")))
        } else {
            Ok(sample_scrape_result())
        }
    }
}

/// Page auditor fake with a configurable failure switch.
pub struct FakeAuditor {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeAuditor {
    pub fn succeeding() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageAuditor for FakeAuditor {
    async fn audit(&self, url: &str) -> Result<AuditScore, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(EngineError::audit(
                url,
                anyhow::anyhow!("audit scripts failed"),
            ))
        } else {
            Ok(sample_score())
        }
    }
}

/// In-memory store that records every status transition and can be told
/// to fail specific writes.
pub struct RecordingStore {
    records: Mutex<Vec<AuditRecord>>,
    pub transitions: Mutex<Vec<(String, AuditStatus)>>,
    fail_update_to: Mutex<Vec<AuditStatus>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            transitions: Mutex::new(Vec::new()),
            fail_update_to: Mutex::new(Vec::new()),
        })
    }

    /// Make future writes of the given status fail.
    pub fn fail_updates_to(&self, status: AuditStatus) {
        self.fail_update_to.lock().unwrap().push(status);
    }

    pub fn seed(&self, url: &str) -> AuditRecord {
        let record = AuditRecord {
            id: Uuid::new_v4().to_string(),
            user_id: ANONYMOUS_USER_ID.to_string(),
            url: url.to_string(),
            status: AuditStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    pub fn status_of(&self, id: &str) -> Option<AuditStatus> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status)
    }

    pub fn transition_log(&self) -> Vec<AuditStatus> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl AuditStore for RecordingStore {
    async fn create(&self, url: &str) -> Result<AuditRecord, StoreError> {
        Ok(self.seed(url))
    }

    async fn update_status(
        &self,
        id: &str,
        status: AuditStatus,
    ) -> Result<AuditRecord, StoreError> {
        if self.fail_update_to.lock().unwrap().contains(&status) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.status = status;
        record.updated_at = Utc::now();

        self.transitions
            .lock()
            .unwrap()
            .push((id.to_string(), status));
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AuditRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_many(&self) -> Result<Vec<AuditRecord>, StoreError> {
        let mut all = self.records.lock().unwrap().clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
