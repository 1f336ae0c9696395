//! Shared Browser Manager
//!
//! One headless Chromium instance per process, launched lazily on first
//! acquire and reused by every scan (and by the screenshot collaborator).
//! Each scan gets its own isolated page; the instance itself is torn down
//! only through [`BrowserManager::shutdown`].

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{HeropickError, Result};
use crate::types::ScanConfig;

#[derive(Clone)]
pub struct BrowserManager {
    cfg: ScanConfig,
    browser: Arc<Mutex<Option<Browser>>>,
}

impl BrowserManager {
    pub fn new(cfg: ScanConfig) -> Self {
        Self {
            cfg,
            browser: Arc::new(Mutex::new(None)),
        }
    }

    /// Launch the shared browser if not already running.
    async fn ensure_browser(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        info!("launching shared headless browser");

        let mut builder = BrowserConfig::builder()
            .window_size(self.cfg.viewport_width, self.cfg.viewport_height)
            .no_sandbox()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--mute-audio")
            .arg("--hide-scrollbars");

        if let Some(ref path) = self.cfg.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| HeropickError::browser_error(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| HeropickError::browser_error(format!("launch failed: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {e}");
                }
            }
        });

        *guard = Some(browser);
        Ok(())
    }

    /// Open an isolated page against the shared instance.
    ///
    /// The caller owns the page and must close it on every exit path; pages
    /// never outlive a single scan.
    pub async fn acquire_page(&self) -> Result<Page> {
        self.ensure_browser().await?;
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| HeropickError::browser_error("browser not initialized"))?;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| HeropickError::browser_error(format!("new page: {e}")))
    }

    /// Tear down the shared instance. Invoked by the hosting process's
    /// lifecycle, not by individual scans.
    pub async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            let _ = browser.close().await;
            let _ = browser.wait().await;
            info!("shared browser closed");
        }
    }
}
