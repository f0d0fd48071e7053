//! Headless Chromium session management.
//!
//! Each engine invocation gets one isolated browser process with its own
//! temp profile directory. Teardown is guaranteed on every exit path and
//! never masks a primary error: close failures are logged and swallowed.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// CDP request timeout applied to every command in a session.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Find a Chrome/Chromium executable on the system.
///
/// `CHROMIUM_PATH` overrides all probing.
pub fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            debug!("using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            debug!("found browser at: {}", path.display());
            return Ok(path);
        }
    }

    for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
        if let Ok(output) = Command::new("which").arg(cmd).output()
            && output.status.success()
        {
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !found.is_empty() {
                debug!("found browser via 'which {cmd}': {found}");
                return Ok(PathBuf::from(found));
            }
        }
    }

    Err(anyhow!(
        "no Chrome/Chromium executable found (set CHROMIUM_PATH to override)"
    ))
}

/// One isolated headless Chromium process.
///
/// Holds the CDP event handler task and the session's temp profile
/// directory. [`HeadlessBrowserSession::close`] tears everything down;
/// `Drop` aborts the handler and removes the profile as a backstop when
/// close was never reached.
#[derive(Debug)]
pub struct HeadlessBrowserSession {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
    profile_dir: Option<TempDir>,
}

impl HeadlessBrowserSession {
    /// Launch a fresh headless browser with its own profile directory.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_browser_executable()?;

        let profile_dir = tempfile::Builder::new()
            .prefix("sitepulse-chrome-")
            .tempdir()
            .context("failed to create browser profile directory")?;

        let config = BrowserConfigBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir.path())
            .headless_mode(HeadlessMode::default())
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch headless browser")?;

        let handler_task = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // CDP serialization noise is expected; keep it quiet.
                    trace!("browser handler event error: {e}");
                }
            }
            debug!("browser handler task finished");
        });

        Ok(Self {
            browser,
            handler: Some(handler_task),
            profile_dir: Some(profile_dir),
        })
    }

    /// Open a page with a fixed desktop viewport.
    pub async fn open_page(&self, width: u32, height: u32) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open browser page")?;

        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(width as i64)
                .height(height as i64)
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(|e| anyhow!("failed to build viewport override: {e}"))?,
        )
        .await
        .context("failed to apply desktop viewport")?;

        Ok(page)
    }

    /// Tear the session down, swallowing every cleanup error.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("failed to wait for browser exit: {e}");
        }
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
        if let Some(dir) = self.profile_dir.take()
            && let Err(e) = dir.close()
        {
            warn!("failed to remove browser profile directory: {e}");
        }
        info!("browser session closed");
    }
}

impl Drop for HeadlessBrowserSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
        // TempDir removal happens in its own Drop; Browser::drop kills
        // the Chrome process if close() was never called.
    }
}

/// Close a page, swallowing and logging any error.
pub async fn close_page_quietly(page: Page) {
    if let Err(e) = page.close().await {
        debug!("failed to close page: {e}");
    }
}

/// Navigate to `url` and wait until the page settles, bounded by `timeout`.
///
/// Settling means the navigation response arrived, `document.readyState`
/// is `complete` and a short idle buffer has elapsed.
pub async fn navigate(page: &Page, url: &str, timeout: Duration) -> Result<()> {
    tokio::time::timeout(timeout, async {
        page.goto(url)
            .await
            .map_err(|e| anyhow!("navigation failed: {e}"))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| anyhow!("page load failed: {e}"))?;
        wait_for_page_settle(page).await;
        Ok::<_, anyhow::Error>(())
    })
    .await
    .map_err(|_| anyhow!("navigation to {url} timed out after {}s", timeout.as_secs()))?
}

/// Poll until `document.readyState === 'complete'`, then let the network
/// go quiet for a beat. The caller's outer timeout bounds this loop.
async fn wait_for_page_settle(page: &Page) {
    const READY_STATE_SCRIPT: &str = "document.readyState";
    let poll_interval = Duration::from_millis(100);
    let start = Instant::now();

    loop {
        match page.evaluate(READY_STATE_SCRIPT).await {
            Ok(result) => {
                if matches!(result.into_value::<String>().as_deref(), Ok("complete")) {
                    debug!(
                        "page ready after {:.2}s",
                        start.elapsed().as_secs_f64()
                    );
                    break;
                }
            }
            Err(e) => {
                trace!("readyState check failed, retrying: {e}");
            }
        }
        tokio::time::sleep(poll_interval).await;
    }

    // Settle buffer for late XHRs and lazy-loaded assets.
    tokio::time::sleep(Duration::from_millis(200)).await;
}
