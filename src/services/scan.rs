//! Hero Candidate Scanner
//!
//! Renders the page in the shared browser, snapshots candidate elements
//! through an injected script, and hands the plain snapshots to the pure
//! scoring pass. The winning candidate comes back as a resolved URL or a
//! cropped capture depending on mode.
//!
//! Failure policy: a scan never raises. Navigation timeouts, render
//! failures, and empty candidate sets all degrade to [`ScanOutcome::None`];
//! the orchestrator's fallback chain is the recovery mechanism.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::page::{Page, ScreenshotParams};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{HeropickError, Result};
use crate::services::browser::BrowserManager;
use crate::services::filter::normalize_image_url;
use crate::services::score::{score_candidates, select_candidate};
use crate::types::{CandidateSnapshot, RankedCandidate, ScanConfig, ScanMode, ScanOutcome};

/// Enumerates in-page candidates as plain data: images, canvases, and
/// background-image carriers, each with viewport geometry, style visibility,
/// and a video-context flag (video/iframe nesting either direction, embed
/// player markers, 16:9 padding-hack wrappers).
const SNAPSHOT_SCRIPT: &str = r#"
(() => {
  const EMBED_MARKERS = ['video', 'player', 'youtube', 'vimeo', 'wistia', 'embed'];

  const styleVisible = (el) => {
    const s = window.getComputedStyle(el);
    return s.display !== 'none'
      && s.visibility !== 'hidden'
      && parseFloat(s.opacity || '1') > 0.01;
  };

  const videoContext = (el) => {
    if (el.closest('video, iframe')) return true;
    if (el.querySelector && el.querySelector('video, iframe')) return true;
    let node = el;
    for (let i = 0; node && i < 4; i++) {
      const sig = ((node.className || '') + ' ' + (node.id || '')).toString().toLowerCase();
      if (EMBED_MARKERS.some((m) => sig.includes(m))) return true;
      const s = window.getComputedStyle(node);
      const pb = parseFloat(s.paddingBottom || '0');
      const w = node.clientWidth || 0;
      if (w > 0 && pb > 0 && Math.abs(pb / w - 9 / 16) < 0.01) return true;
      node = node.parentElement;
    }
    return false;
  };

  const out = [];
  const push = (el, kind, source) => {
    const r = el.getBoundingClientRect();
    out.push({
      kind: kind,
      top: r.top,
      left: r.left,
      width: r.width,
      height: r.height,
      source: source || '',
      visible: styleVisible(el),
      video_context: videoContext(el),
    });
  };

  document.querySelectorAll('img').forEach((el) => {
    push(el, 'image', el.currentSrc || el.src || '');
  });
  document.querySelectorAll('canvas').forEach((el) => {
    push(el, 'canvas', '');
  });
  document.querySelectorAll('section, div, figure, a, span').forEach((el) => {
    const bg = window.getComputedStyle(el).backgroundImage;
    if (bg && bg !== 'none' && bg.includes('url(')) {
      const m = bg.match(/url\(["']?([^"')]+)["']?\)/);
      push(el, 'background', m ? m[1] : '');
    }
  });
  return out;
})()
"#;

#[async_trait]
pub trait HeroScanner: Send + Sync {
    fn name(&self) -> &'static str;
    async fn scan(&self, product_url: &Url, attempt: u32, mode: ScanMode) -> ScanOutcome;
}

pub struct ChromiumScanner {
    browser: BrowserManager,
    cfg: ScanConfig,
}

impl ChromiumScanner {
    pub fn new(browser: BrowserManager, cfg: ScanConfig) -> Self {
        Self { browser, cfg }
    }

    async fn scan_inner(
        &self,
        page: &Page,
        product_url: &Url,
        attempt: u32,
        mode: ScanMode,
    ) -> Result<ScanOutcome> {
        let goto = tokio::time::timeout(
            Duration::from_millis(self.cfg.navigation_timeout_ms),
            page.goto(product_url.as_str()),
        )
        .await;
        match goto {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(HeropickError::browser_error(format!("navigation: {e}")));
            }
            Err(_) => {
                return Err(HeropickError::browser_error(format!(
                    "navigation timed out after {}ms",
                    self.cfg.navigation_timeout_ms
                )));
            }
        }
        let _ = page.wait_for_navigation().await;

        // Fixed settle delay for lazy content and layout.
        tokio::time::sleep(Duration::from_millis(self.cfg.settle_delay_ms)).await;

        let value = page
            .evaluate(SNAPSHOT_SCRIPT)
            .await
            .map_err(|e| HeropickError::browser_error(format!("snapshot script: {e}")))?;
        let snapshots: Vec<CandidateSnapshot> = value
            .into_value()
            .map_err(|e| HeropickError::browser_error(format!("snapshot decode: {e:?}")))?;

        debug!(
            url = %product_url,
            candidates = snapshots.len(),
            "scanned page for hero candidates"
        );

        let ranked = score_candidates(snapshots, product_url, &self.cfg);
        let Some(pick) = select_candidate(&ranked, attempt, &self.cfg) else {
            return Ok(ScanOutcome::None);
        };

        match mode {
            ScanMode::ResolveUrl => Ok(self.resolve_url(pick, product_url)),
            ScanMode::Capture => self.capture(page, pick).await,
        }
    }

    fn resolve_url(&self, pick: &RankedCandidate, product_url: &Url) -> ScanOutcome {
        match normalize_image_url(&pick.snapshot.source, product_url) {
            Some(url) => ScanOutcome::Url(url),
            None => ScanOutcome::None,
        }
    }

    async fn capture(&self, page: &Page, pick: &RankedCandidate) -> Result<ScanOutcome> {
        let b = &pick.snapshot;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(Viewport {
                x: b.left.max(0.0),
                y: b.top.max(0.0),
                width: b.width,
                height: b.height,
                scale: 1.0,
            })
            .build();
        let png = page
            .screenshot(params)
            .await
            .map_err(|e| HeropickError::browser_error(format!("capture: {e}")))?;
        Ok(ScanOutcome::Capture(png))
    }
}

#[async_trait]
impl HeroScanner for ChromiumScanner {
    fn name(&self) -> &'static str {
        "chromium-scanner"
    }

    async fn scan(&self, product_url: &Url, attempt: u32, mode: ScanMode) -> ScanOutcome {
        let page = match self.browser.acquire_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %product_url, "scan skipped, no page: {e}");
                return ScanOutcome::None;
            }
        };

        // Page teardown on every exit path, success or failure.
        let outcome = self.scan_inner(&page, product_url, attempt, mode).await;
        if let Err(e) = page.close().await {
            debug!("page close: {e}");
        }

        match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url = %product_url, "scan failed: {e}");
                ScanOutcome::None
            }
        }
    }
}
