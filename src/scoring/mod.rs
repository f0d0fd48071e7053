//! Page-quality scoring engine.
//!
//! Launches its own isolated browser process per invocation, runs the
//! three category audits (performance, accessibility, SEO) under
//! desktop emulation and returns normalized integer scores. The browser
//! is terminated on every exit path; teardown errors are swallowed.

pub mod js_audits;
pub mod score;

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use tracing::debug;

use crate::browser::{close_page_quietly, navigate, HeadlessBrowserSession};
use crate::processor::{EngineError, PageAuditor};
use crate::scraper::{NAVIGATION_TIMEOUT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
pub use score::AuditScore;
use score::normalize_score;

/// Configuration for [`PageAuditEngine`].
#[derive(Debug, Clone)]
pub struct AuditEngineConfig {
    pub navigation_timeout: Duration,
}

impl Default for AuditEngineConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }
}

/// Categorized page-quality audit engine.
#[derive(Debug, Clone, Default)]
pub struct PageAuditEngine {
    config: AuditEngineConfig,
}

impl PageAuditEngine {
    pub fn new(config: AuditEngineConfig) -> Self {
        Self { config }
    }

    /// Audit one URL with a dedicated browser session.
    pub async fn audit(&self, url: &str) -> Result<AuditScore, EngineError> {
        let session = HeadlessBrowserSession::launch()
            .await
            .map_err(|e| EngineError::audit(url, e))?;

        let result = self.audit_with_session(&session, url).await;
        session.close().await;

        result.map_err(|e| EngineError::audit(url, e))
    }

    async fn audit_with_session(
        &self,
        session: &HeadlessBrowserSession,
        url: &str,
    ) -> Result<AuditScore> {
        let page = session.open_page(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await?;
        let result = self.collect_scores(&page, url).await;
        close_page_quietly(page).await;
        result
    }

    async fn collect_scores(&self, page: &Page, url: &str) -> Result<AuditScore> {
        navigate(page, url, self.config.navigation_timeout).await?;

        let performance =
            category_score(page, js_audits::PERFORMANCE_AUDIT_SCRIPT, "performance").await?;
        let accessibility =
            category_score(page, js_audits::ACCESSIBILITY_AUDIT_SCRIPT, "accessibility").await?;
        let seo = category_score(page, js_audits::SEO_AUDIT_SCRIPT, "seo").await?;

        let score = AuditScore {
            performance: normalize_score(performance),
            accessibility: normalize_score(accessibility),
            seo: normalize_score(seo),
        };
        debug!(
            performance = score.performance,
            accessibility = score.accessibility,
            seo = score.seo,
            "page audit scored"
        );
        Ok(score)
    }
}

#[async_trait]
impl PageAuditor for PageAuditEngine {
    async fn audit(&self, url: &str) -> Result<AuditScore, EngineError> {
        PageAuditEngine::audit(self, url).await
    }
}

/// Run one category script and read its raw `[0, 1]` score.
///
/// A `null` result means the category could not be scored and maps to
/// `None` (normalized to 0 by the caller).
async fn category_score(page: &Page, script: &str, category: &str) -> Result<Option<f64>> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| anyhow!("failed to run {category} audit script: {e}"))?;

    let value: serde_json::Value = result
        .into_value()
        .map_err(|e| anyhow!("failed to read {category} audit result: {e}"))?;

    Ok(value.as_f64())
}
