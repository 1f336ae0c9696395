//! Metadata Fallback Extractor
//!
//! Last-resort single candidate: the page's social-preview metadata image.

use scraper::Html;

use crate::selectors::META_SELECTOR;

const IMAGE_KEYS: &[&str] = &["og:image", "og:image:secure_url", "twitter:image"];

/// Return the social-preview image URL if the markup declares one.
pub fn extract_og_image(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let mut pairs: Vec<(String, String)> = Vec::new();
    for meta in doc.select(&META_SELECTOR) {
        let key = meta
            .value()
            .attr("property")
            .or_else(|| meta.value().attr("name"));
        let content = meta.value().attr("content");
        if let (Some(k), Some(v)) = (key, content) {
            pairs.push((k.to_string(), v.to_string()));
        }
    }

    find_metadata_value(&pairs, IMAGE_KEYS)
}

/// Find the first non-empty value for any of the given keys in metadata pairs.
fn find_metadata_value(pairs: &[(String, String)], keys: &[&str]) -> Option<String> {
    for key in keys {
        for (k, v) in pairs {
            if k.eq_ignore_ascii_case(key) {
                let cleaned = v.trim().to_string();
                if !cleaned.is_empty() {
                    return Some(cleaned);
                }
            }
        }
    }
    None
}
