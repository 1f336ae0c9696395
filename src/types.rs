use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HeropickError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain(pub String);

impl Domain {
    /// Canonicalize host to a stable key: lowercase + IDNA/Punycode, `www.` stripped.
    fn canonicalize(host: &str) -> String {
        let lower = host.to_ascii_lowercase();
        let ascii = idna::domain_to_ascii(&lower).unwrap_or(lower);
        ascii
            .strip_prefix("www.")
            .map(|s| s.to_string())
            .unwrap_or(ascii)
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        url.domain().map(|d| Domain(Self::canonicalize(d)))
    }

    /// Build a Domain from raw user text (CLI, API callers, etc.)
    pub fn from_raw(host: &str) -> Self {
        Domain(Self::canonicalize(host))
    }

    pub fn parse_from_url(url: &str) -> Result<(Url, Self)> {
        let parsed = Url::parse(url).map_err(|_| HeropickError::InvalidUrl(url.into()))?;
        let domain = Self::from_url(&parsed).ok_or(HeropickError::MissingDomain)?;
        Ok((parsed, domain))
    }

    /// Registrable-domain approximation: the last two labels of the host.
    /// `images.example.com` and `shop.example.com` both reduce to `example.com`.
    pub fn base(&self) -> Domain {
        let labels: Vec<&str> = self.0.rsplitn(3, '.').collect();
        if labels.len() < 3 {
            return self.clone();
        }
        Domain(format!("{}.{}", labels[1], labels[0]))
    }
}

/// Trust origin of a cached image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Manual,
    Auto,
}

/// Persisted mapping `domain -> image_url`, one entry per domain (upsert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub domain: Domain,
    pub image_url: String,
    pub source: Provenance,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn manual(domain: Domain, image_url: impl Into<String>) -> Self {
        Self {
            domain,
            image_url: image_url.into(),
            source: Provenance::Manual,
            updated_at: Utc::now(),
        }
    }
}

/// Kind of in-page visual element considered during hero scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Image,
    Canvas,
    Background,
}

/// Plain data snapshot of one candidate, produced by the DOM snapshot
/// provider. Scoring operates on this alone, no live browser involved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub kind: CandidateKind,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Resolved URL; empty for canvas/background candidates captured visually.
    #[serde(default)]
    pub source: String,
    pub visible: bool,
    /// True when the element is, nests, or is nested inside a video/iframe,
    /// an embed-player container, or a 16:9 padding-hack wrapper.
    #[serde(default)]
    pub video_context: bool,
}

impl CandidateSnapshot {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A scored candidate; higher score is better. Ties keep scan order.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub snapshot: CandidateSnapshot,
    pub score: f64,
}

/// One resolution attempt. `attempt` selects a rotation index, not a cache
/// key: repeated calls with the same attempt against an unchanged page yield
/// the same result.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub product_url: String,
    pub attempt: u32,
    pub manual_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Resolve the winning candidate to a dereferenceable URL.
    ResolveUrl,
    /// Crop a screenshot to the winning candidate's bounding box.
    Capture,
}

/// Scanner result. `None` covers every recoverable failure: navigation
/// timeout, render failure, zero qualifying candidates.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Url(String),
    Capture(Vec<u8>),
    None,
}

impl ScanOutcome {
    pub fn is_none(&self) -> bool {
        matches!(self, ScanOutcome::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Fixed settle delay after navigation, lets lazy content and layout stabilize.
    pub settle_delay_ms: u64,
    pub navigation_timeout_ms: u64,
    /// Noise floor: rendered area below this is never a candidate.
    pub min_area: f64,
    /// Width of the rotation window over ranked candidates.
    pub top_n: usize,
    /// Penalty per pixel of distance from the viewport top (above-the-fold bias).
    pub top_offset_weight: f64,
    /// Fixed bonus for image-kind candidates over canvas/background.
    pub image_kind_bonus: f64,
    /// Smaller bonus for product-shape keywords in the resolved URL.
    pub keyword_bonus: f64,
    /// Penalty for blacklist matches in the resolved URL.
    pub blacklist_penalty: f64,
    /// Path to a Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 800,
            settle_delay_ms: 2_500,
            navigation_timeout_ms: 30_000,
            min_area: 10_000.0,
            top_n: 5,
            top_offset_weight: 2.0,
            image_kind_bonus: 500_000.0,
            keyword_bonus: 50_000.0,
            blacklist_penalty: 1_000_000.0,
            chrome_path: None,
        }
    }
}

/// Handy wrapper when you want to pass the whole engine config as one object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub fetch: FetchConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
