//! Structural/UX website scraper.
//!
//! Drives one isolated headless browser per invocation: navigates with a
//! bounded wait, extracts metadata, headings, CTAs, forms and the
//! navigation landmark, and captures a viewport-only screenshot. The
//! browser and page are released on every exit path; release errors are
//! logged, never propagated.

pub mod js_scripts;
pub mod schema;
mod visibility;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::Page;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::browser::{close_page_quietly, navigate, HeadlessBrowserSession};
use crate::processor::{EngineError, Scraper};
use schema::{
    NavigationSummary, PageMetadata, RawCtaPayload, RawForm, RawHeading, RawNavigation,
    ScrapeResult,
};

/// Fixed desktop viewport.
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;

/// Bound on navigation plus page settle.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`WebsiteScraper`].
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Directory screenshots are written to; created if absent.
    pub screenshots_dir: PathBuf,
    pub navigation_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            screenshots_dir: PathBuf::from("screenshots"),
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }
}

/// Headless-browser scraper producing [`ScrapeResult`]s.
#[derive(Debug, Clone)]
pub struct WebsiteScraper {
    config: ScraperConfig,
}

impl WebsiteScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Scrape one URL with a dedicated browser session.
    pub async fn scrape(&self, url: &str) -> Result<ScrapeResult, EngineError> {
        let session = HeadlessBrowserSession::launch()
            .await
            .map_err(|e| EngineError::scrape(url, e))?;

        let result = self.scrape_with_session(&session, url).await;
        session.close().await;

        result.map_err(|e| EngineError::scrape(url, e))
    }

    async fn scrape_with_session(
        &self,
        session: &HeadlessBrowserSession,
        url: &str,
    ) -> Result<ScrapeResult> {
        let page = session.open_page(VIEWPORT_WIDTH, VIEWPORT_HEIGHT).await?;
        let result = self.extract(&page, url).await;
        close_page_quietly(page).await;
        result
    }

    async fn extract(&self, page: &Page, url: &str) -> Result<ScrapeResult> {
        navigate(page, url, self.config.navigation_timeout).await?;

        let metadata = extract_metadata(page).await;

        let raw_headings: Vec<RawHeading> =
            evaluate_parsed(page, js_scripts::HEADINGS_SCRIPT, "headings").await?;
        let headings = visibility::filter_headings(raw_headings);

        let cta_payload: RawCtaPayload =
            evaluate_parsed(page, js_scripts::CTAS_SCRIPT, "ctas").await?;
        let ctas = visibility::filter_ctas(cta_payload);

        let raw_forms: Vec<RawForm> =
            evaluate_parsed(page, js_scripts::FORMS_SCRIPT, "forms").await?;
        let forms = raw_forms
            .into_iter()
            .map(|f| schema::FormSummary {
                input_count: f.input_count,
            })
            .collect();

        let raw_nav: RawNavigation =
            evaluate_parsed(page, js_scripts::NAVIGATION_SCRIPT, "navigation").await?;
        let navigation = NavigationSummary {
            link_count: raw_nav.link_count,
        };

        let screenshot_path = self.capture_screenshot(page).await?;

        Ok(ScrapeResult {
            metadata,
            headings,
            ctas,
            forms,
            navigation,
            screenshot_path,
        })
    }

    /// Viewport-only PNG written under the screenshots directory.
    async fn capture_screenshot(&self, page: &Page) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config.screenshots_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create screenshots directory {}",
                    self.config.screenshots_dir.display()
                )
            })?;

        let path = screenshot_path(&self.config.screenshots_dir, Utc::now().timestamp_millis());

        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        };

        let data = page
            .screenshot(params)
            .await
            .map_err(|e| anyhow!("failed to capture screenshot: {e}"))?;

        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("failed to write screenshot to {}", path.display()))?;

        debug!("screenshot saved to {}", path.display());
        Ok(path)
    }
}

#[async_trait]
impl Scraper for WebsiteScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, EngineError> {
        WebsiteScraper::scrape(self, url).await
    }
}

/// Screenshot path for one invocation, unique per timestamp.
pub(crate) fn screenshot_path(dir: &Path, epoch_millis: i64) -> PathBuf {
    dir.join(format!("screenshot-{epoch_millis}.png"))
}

/// Title and meta-description are best-effort: any failure yields nulls.
async fn extract_metadata(page: &Page) -> PageMetadata {
    match evaluate_parsed::<PageMetadata>(page, js_scripts::METADATA_SCRIPT, "metadata").await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("metadata extraction failed, continuing without it: {e}");
            PageMetadata::default()
        }
    }
}

/// Evaluate a script and deserialize its JSON result.
async fn evaluate_parsed<T: DeserializeOwned>(page: &Page, script: &str, what: &str) -> Result<T> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| anyhow!("failed to execute {what} extraction script: {e}"))?;

    result
        .into_value()
        .map_err(|e| anyhow!("failed to parse {what} from page result: {e}"))
}
