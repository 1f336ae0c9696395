//! Candidate Scoring
//!
//! Pure functions over plain DOM snapshots: qualification, scoring, stable
//! ranking, and the deterministic rotation that maps a retry counter to a
//! stable alternate pick. No live browser involved, fully unit-testable.

use url::Url;

use crate::services::filter::should_discard;
use crate::types::{CandidateKind, CandidateSnapshot, RankedCandidate, ScanConfig};

/// Keywords in a resolved URL hinting at product-shaped imagery.
const PRODUCT_SHAPE_KEYWORDS: &[&str] = &[
    "bottle", "jar", "pack", "bundle", "box", "tube", "capsule", "pouch", "product", "supplement",
];

/// Keep only candidates that qualify: style-visible, vertically intersecting
/// the viewport, above the area noise floor, and outside any video context.
fn qualifies(c: &CandidateSnapshot, cfg: &ScanConfig) -> bool {
    if !c.visible || c.video_context {
        return false;
    }
    if c.area() < cfg.min_area {
        return false;
    }
    let viewport_h = cfg.viewport_height as f64;
    c.top < viewport_h && c.top + c.height > 0.0
}

fn score(c: &CandidateSnapshot, product_url: &Url, cfg: &ScanConfig) -> f64 {
    let mut score = c.area() - c.top.max(0.0) * cfg.top_offset_weight;

    if c.kind == CandidateKind::Image {
        score += cfg.image_kind_bonus;
    }
    if !c.source.is_empty() {
        let lower = c.source.to_ascii_lowercase();
        if PRODUCT_SHAPE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            score += cfg.keyword_bonus;
        }
        if should_discard(&c.source, product_url) {
            score -= cfg.blacklist_penalty;
        }
    }

    score
}

/// Score and rank candidates, descending; ties keep scan order (stable sort).
pub fn score_candidates(
    snapshots: Vec<CandidateSnapshot>,
    product_url: &Url,
    cfg: &ScanConfig,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = snapshots
        .into_iter()
        .filter(|c| qualifies(c, cfg))
        .map(|snapshot| {
            let score = score(&snapshot, product_url, cfg);
            RankedCandidate { snapshot, score }
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Deterministic rotation: map a retry counter to an index over `len` items.
///
/// One convention for the whole engine: attempts 0 and 1 both select the
/// best item, attempts `1..=len` visit each index exactly once, and
/// `len + 1` wraps back to the best.
pub fn rotation_index(attempt: u32, len: usize) -> usize {
    debug_assert!(len > 0);
    ((attempt.max(1) - 1) as usize) % len
}

/// Pick the rotation winner from the ranked list, bounded to the top-N window.
pub fn select_candidate<'a>(
    ranked: &'a [RankedCandidate],
    attempt: u32,
    cfg: &ScanConfig,
) -> Option<&'a RankedCandidate> {
    if ranked.is_empty() {
        return None;
    }
    let window = ranked.len().min(cfg.top_n.max(1));
    Some(&ranked[rotation_index(attempt, window)])
}
