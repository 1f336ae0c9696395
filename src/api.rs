//! Public Facade
//!
//! `resolve_product_image` is the primary entry point consumed by
//! page-generation collaborators. It never fails: every internal error
//! degrades to the next fallback stage or to `""`.

use once_cell::sync::Lazy;
use tracing::warn;

use crate::engine::Engine;
use crate::services::browser::BrowserManager;
use crate::services::cache::{ImageCacheStore, LocalFsStore};
use crate::services::fetch::{PageFetcher, ReqwestFetcher};
use crate::services::scan::{ChromiumScanner, HeroScanner};
use crate::types::{ResolutionRequest, ResolveConfig};

/// Process-wide shared browser, created lazily on first scan. The screenshot
/// collaborator consumes the same instance; scans never assume exclusive use.
static SHARED_BROWSER: Lazy<BrowserManager> =
    Lazy::new(|| BrowserManager::new(ResolveConfig::default().scan));

/* ------------ public facade components ------------ */

pub struct Components {
    pub fetcher: Box<dyn PageFetcher>,
    pub scanner: Box<dyn HeroScanner>,
}

impl Components {
    pub fn with_config(cfg: ResolveConfig) -> crate::error::Result<Self> {
        let fetcher = ReqwestFetcher::new(cfg.fetch)?;
        let scanner = ChromiumScanner::new(SHARED_BROWSER.clone(), cfg.scan);
        Ok(Self {
            fetcher: Box::new(fetcher),
            scanner: Box::new(scanner),
        })
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::with_config(ResolveConfig::default()).expect("failed to init reqwest client")
    }
}

pub fn make_engine<'a, CS: ImageCacheStore>(
    store: &'a CS,
    components: &'a Components,
) -> Engine<'a, CS> {
    Engine::new(store, &*components.fetcher, &*components.scanner)
}

/* ------------ resolution entry points ------------ */

/// Resolve a directly usable product-image URL, or `""` if nothing could be
/// resolved. Never returns an error.
///
/// `attempt` is a rotation index: the same attempt against an unchanged page
/// yields the same result, and consecutive attempts surface different
/// high-quality candidates.
///
/// # Examples
/// ```no_run
/// # async fn example() {
/// let url = heropick::resolve_product_image("https://prodentim24.com/", 0, None).await;
/// if url.is_empty() {
///     // apply your own placeholder
/// }
/// # }
/// ```
pub async fn resolve_product_image(
    product_url: &str,
    attempt: u32,
    manual_image_url: Option<&str>,
) -> String {
    let store = open_default_store();
    let components = Components::default();
    let engine = make_engine(&store, &components);
    engine
        .resolve(&ResolutionRequest {
            product_url: product_url.to_string(),
            attempt,
            manual_image_url: manual_image_url.map(|s| s.to_string()),
        })
        .await
}

/// Blocking convenience wrapper over [`resolve_product_image`] for callers
/// without a runtime, executed on the shared global runtime.
pub fn resolve_product_image_blocking(
    product_url: &str,
    attempt: u32,
    manual_image_url: Option<&str>,
) -> String {
    crate::runtime::block_on(resolve_product_image(product_url, attempt, manual_image_url))
}

/// Tear down the shared browser. The single documented shutdown entry point,
/// invoked by the hosting process's lifecycle.
pub async fn shutdown() {
    SHARED_BROWSER.shutdown().await;
}

fn open_default_store() -> LocalFsStore {
    match LocalFsStore::new() {
        Ok(store) => store,
        Err(e) => {
            warn!("data dir unavailable, using temp cache: {e}");
            LocalFsStore::with_root(std::env::temp_dir().join("heropick-cache"))
                .expect("temp dir must be writable")
        }
    }
}
