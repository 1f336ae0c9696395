//! Resolution Orchestrator
//!
//! Sequences the resolution stages into one deterministic decision per
//! `(product_url, attempt, manual_image_url)` triple. Stages are an explicit
//! ordered list evaluated top-to-bottom, first non-empty result wins; every
//! stage failure is recoverable and simply advances the chain. The engine
//! never returns an error to its caller.

use tracing::{info, warn};
use url::Url;

use crate::services::cache::ImageCacheStore;
use crate::services::extract::extract_image_urls;
use crate::services::fetch::PageFetcher;
use crate::services::metadata::extract_og_image;
use crate::services::scan::HeroScanner;
use crate::services::score::rotation_index;
use crate::types::{CacheEntry, Domain, ResolutionRequest, ScanMode, ScanOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Caller-supplied image wins outright; cached when provenance allows.
    Manual,
    /// Per-domain cache read.
    Cache,
    /// Browser-rendered hero scan (URL mode only on this path).
    Scan,
    /// Document-order static extraction with attempt rotation.
    StaticHtml,
    /// Social-preview metadata, last resort.
    Metadata,
}

const STAGES: [Stage; 5] = [
    Stage::Manual,
    Stage::Cache,
    Stage::Scan,
    Stage::StaticHtml,
    Stage::Metadata,
];

pub struct Engine<'a, CS: ImageCacheStore> {
    pub store: &'a CS,
    pub fetcher: &'a dyn PageFetcher,
    pub scanner: &'a dyn HeroScanner,
}

impl<'a, CS: ImageCacheStore> Engine<'a, CS> {
    pub fn new(store: &'a CS, fetcher: &'a dyn PageFetcher, scanner: &'a dyn HeroScanner) -> Self {
        Self {
            store,
            fetcher,
            scanner,
        }
    }

    /// Resolve a usable image URL for the request, or `""` when every stage
    /// comes up empty. Invalid product URLs short-circuit without invoking
    /// any stage.
    pub async fn resolve(&self, req: &ResolutionRequest) -> String {
        let Ok((product_url, domain)) = Domain::parse_from_url(&req.product_url) else {
            warn!(url = %req.product_url, "invalid product url");
            return String::new();
        };

        for stage in STAGES {
            if let Some(url) = self.run_stage(stage, req, &product_url, &domain).await {
                if !url.is_empty() {
                    info!(url = %req.product_url, ?stage, image = %url, "resolved");
                    return url;
                }
            }
        }

        info!(url = %req.product_url, "no image found");
        String::new()
    }

    async fn run_stage(
        &self,
        stage: Stage,
        req: &ResolutionRequest,
        product_url: &Url,
        domain: &Domain,
    ) -> Option<String> {
        match stage {
            Stage::Manual => self.manual_override(req, domain),
            Stage::Cache => self.cached_image(domain),
            Stage::Scan => self.hero_scan(req, product_url).await,
            Stage::StaticHtml => self.static_extraction(req, product_url).await,
            Stage::Metadata => self.metadata_fallback(req).await,
        }
    }

    /// Manual image takes precedence over everything. It is cached only when
    /// its host shares the product's base domain, so an unrelated CDN link
    /// can never poison the per-domain cache.
    fn manual_override(&self, req: &ResolutionRequest, domain: &Domain) -> Option<String> {
        let manual = req.manual_image_url.as_deref()?.trim();
        if manual.is_empty() {
            return None;
        }

        if let Ok((_, manual_domain)) = Domain::parse_from_url(manual) {
            if manual_domain.base() == domain.base() {
                let entry = CacheEntry::manual(domain.base(), manual);
                if let Err(e) = self.store.set(&entry) {
                    warn!(domain = %domain.0, "cache write failed: {e}");
                }
            }
        }

        Some(manual.to_string())
    }

    fn cached_image(&self, domain: &Domain) -> Option<String> {
        match self.store.get(&domain.base()) {
            Ok(entry) => entry.map(|e| e.image_url),
            Err(e) => {
                warn!(domain = %domain.0, "cache read failed: {e}");
                None
            }
        }
    }

    /// The product-image path must terminate in a dereferenceable URL, so a
    /// raw/embedded payload is never accepted here; capture mode belongs to
    /// the screenshot collaborator.
    async fn hero_scan(&self, req: &ResolutionRequest, product_url: &Url) -> Option<String> {
        match self
            .scanner
            .scan(product_url, req.attempt, ScanMode::ResolveUrl)
            .await
        {
            ScanOutcome::Url(url) if !url.starts_with("data:") => Some(url),
            ScanOutcome::Url(_) | ScanOutcome::Capture(_) | ScanOutcome::None => None,
        }
    }

    async fn static_extraction(&self, req: &ResolutionRequest, product_url: &Url) -> Option<String> {
        let html = match self.fetcher.fetch(product_url.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %product_url, "static fetch failed: {e}");
                return None;
            }
        };
        let candidates = extract_image_urls(&html, product_url);
        if candidates.is_empty() {
            return None;
        }
        let idx = rotation_index(req.attempt, candidates.len());
        Some(candidates[idx].clone())
    }

    async fn metadata_fallback(&self, req: &ResolutionRequest) -> Option<String> {
        let html = match self.fetcher.fetch(&req.product_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %req.product_url, "metadata fetch failed: {e}");
                return None;
            }
        };
        extract_og_image(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HeropickError, Result};
    use crate::services::cache::LocalFsStore;
    use crate::types::Provenance;
    use async_trait::async_trait;

    struct MockFetcher {
        html: Option<String>,
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        fn name(&self) -> &'static str {
            "mock-fetcher"
        }
        async fn fetch(&self, url: &str) -> Result<String> {
            self.html
                .clone()
                .ok_or_else(|| HeropickError::fetch_error(url, "forced failure"))
        }
    }

    struct MockScanner {
        outcome: ScanOutcome,
    }

    #[async_trait]
    impl HeroScanner for MockScanner {
        fn name(&self) -> &'static str {
            "mock-scanner"
        }
        async fn scan(&self, _url: &Url, _attempt: u32, _mode: ScanMode) -> ScanOutcome {
            self.outcome.clone()
        }
    }

    fn store() -> (tempfile::TempDir, LocalFsStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFsStore::with_root(dir.path().join("images")).expect("store");
        (dir, store)
    }

    fn dead_scanner() -> MockScanner {
        MockScanner {
            outcome: ScanOutcome::None,
        }
    }

    fn dead_fetcher() -> MockFetcher {
        MockFetcher { html: None }
    }

    fn request(url: &str, attempt: u32, manual: Option<&str>) -> ResolutionRequest {
        ResolutionRequest {
            product_url: url.to_string(),
            attempt,
            manual_image_url: manual.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let (_dir, store) = store();
        let fetcher = dead_fetcher();
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("not a url", 0, None)).await;
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_manual_image_precedence() {
        let (_dir, store) = store();
        let fetcher = MockFetcher {
            html: Some(r#"<img src="https://shop.example.com/other.jpg">"#.into()),
        };
        let scanner = MockScanner {
            outcome: ScanOutcome::Url("https://shop.example.com/scan.jpg".into()),
        };
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine
            .resolve(&request(
                "https://shop.example.com/",
                0,
                Some("https://cdn.otherdomain.com/manual.jpg"),
            ))
            .await;
        assert_eq!(result, "https://cdn.otherdomain.com/manual.jpg");
    }

    #[tokio::test]
    async fn test_cache_provenance_guard_rejects_foreign_host() {
        let (_dir, store) = store();
        let fetcher = dead_fetcher();
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        engine
            .resolve(&request(
                "https://shop.example.com/",
                0,
                Some("https://cdn.otherdomain.com/manual.jpg"),
            ))
            .await;
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_provenance_guard_accepts_subdomain() {
        let (_dir, store) = store();
        let fetcher = dead_fetcher();
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        engine
            .resolve(&request(
                "https://shop.example.com/",
                0,
                Some("https://images.example.com/manual.jpg"),
            ))
            .await;

        let entry = store.get(&Domain::from_raw("example.com")).unwrap().unwrap();
        assert_eq!(entry.image_url, "https://images.example.com/manual.jpg");
        assert_eq!(entry.source, Provenance::Manual);
    }

    #[tokio::test]
    async fn test_cache_hit_wins_over_scan() {
        let (_dir, store) = store();
        store
            .set(&CacheEntry::manual(
                Domain::from_raw("example.com"),
                "https://images.example.com/cached.jpg",
            ))
            .unwrap();
        let fetcher = dead_fetcher();
        let scanner = MockScanner {
            outcome: ScanOutcome::Url("https://shop.example.com/scan.jpg".into()),
        };
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("https://shop.example.com/", 0, None)).await;
        assert_eq!(result, "https://images.example.com/cached.jpg");
    }

    #[tokio::test]
    async fn test_scanner_url_accepted() {
        let (_dir, store) = store();
        let fetcher = dead_fetcher();
        let scanner = MockScanner {
            outcome: ScanOutcome::Url("https://shop.example.com/hero.jpg".into()),
        };
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("https://shop.example.com/", 0, None)).await;
        assert_eq!(result, "https://shop.example.com/hero.jpg");
        // auto-resolution never writes the cache
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_raw_payloads_rejected_on_product_path() {
        let (_dir, store) = store();
        let fetcher = MockFetcher {
            html: Some(r#"<img src="https://shop.example.com/static.jpg">"#.into()),
        };
        for outcome in [
            ScanOutcome::Url("data:image/png;base64,AAAA".into()),
            ScanOutcome::Capture(vec![0x89, 0x50, 0x4e, 0x47]),
        ] {
            let scanner = MockScanner { outcome };
            let engine = Engine::new(&store, &fetcher, &scanner);
            let result = engine.resolve(&request("https://shop.example.com/", 0, None)).await;
            assert_eq!(result, "https://shop.example.com/static.jpg");
        }
    }

    #[tokio::test]
    async fn test_static_fallback_prodentim_scenario() {
        // Scanner unavailable, static extractor yields two filtered
        // candidates, attempt 0 selects index 0.
        let (_dir, store) = store();
        let fetcher = MockFetcher {
            html: Some(
                r#"<html><body>
                    <img src="https://prodentim24.com/img/a.jpg">
                    <img src="https://prodentim24.com/img/b.jpg">
                </body></html>"#
                    .into(),
            ),
        };
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("https://prodentim24.com/", 0, None)).await;
        assert_eq!(result, "https://prodentim24.com/img/a.jpg");
    }

    #[tokio::test]
    async fn test_static_rotation_and_determinism() {
        let (_dir, store) = store();
        let fetcher = MockFetcher {
            html: Some(
                r#"<img src="https://prodentim24.com/img/a.jpg">
                   <img src="https://prodentim24.com/img/b.jpg">"#
                    .into(),
            ),
        };
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        let first = engine.resolve(&request("https://prodentim24.com/", 2, None)).await;
        assert_eq!(first, "https://prodentim24.com/img/b.jpg");

        // same attempt against the unchanged page: same result
        let again = engine.resolve(&request("https://prodentim24.com/", 2, None)).await;
        assert_eq!(again, first);

        // rotation wraps past the end of the list
        let wrapped = engine.resolve(&request("https://prodentim24.com/", 3, None)).await;
        assert_eq!(wrapped, "https://prodentim24.com/img/a.jpg");
    }

    #[tokio::test]
    async fn test_metadata_fallback_when_static_empty() {
        let (_dir, store) = store();
        let fetcher = MockFetcher {
            html: Some(
                r#"<html><head>
                    <meta property="og:image" content="https://shop.example.com/og.jpg">
                </head><body></body></html>"#
                    .into(),
            ),
        };
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("https://shop.example.com/", 0, None)).await;
        assert_eq!(result, "https://shop.example.com/og.jpg");
    }

    #[tokio::test]
    async fn test_fallback_exhaustion_returns_empty() {
        let (_dir, store) = store();
        let fetcher = dead_fetcher();
        let scanner = dead_scanner();
        let engine = Engine::new(&store, &fetcher, &scanner);

        let result = engine.resolve(&request("https://shop.example.com/", 0, None)).await;
        assert_eq!(result, "");
    }
}
