//! Static HTML Extractor
//!
//! Collects every surviving image reference from raw markup, in document
//! order. Intentionally dumb: no scoring, no dedupe, no re-ranking. This is
//! the safety net for when the rendering-based scanner yields nothing.

use scraper::Html;
use url::Url;

use crate::selectors::IMG_SELECTOR;
use crate::services::filter::{normalize_image_url, should_discard};

/// Extract filtered image URLs from `html`, in document order.
///
/// Each `<img>` contributes its direct `src` first; only when the direct
/// source is empty or discarded does its `srcset` contribute, each entry
/// individually normalized and filtered.
pub fn extract_image_urls(html: &str, product_url: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    for img in doc.select(&IMG_SELECTOR) {
        let src = img.value().attr("src").unwrap_or("");
        if let Some(url) = normalize_image_url(src, product_url) {
            if !should_discard(&url, product_url) {
                out.push(url);
                continue;
            }
        }

        if let Some(srcset) = img.value().attr("srcset") {
            for entry in srcset.split(',') {
                // "url 2x" / "url 640w" -> url
                let reference = entry.trim().split_whitespace().next().unwrap_or("");
                if let Some(url) = normalize_image_url(reference, product_url) {
                    if !should_discard(&url, product_url) {
                        out.push(url);
                    }
                }
            }
        }
    }

    out
}
