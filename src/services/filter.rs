//! URL/Image Filter
//!
//! Pure functions deciding which image references survive: normalization of
//! relative/protocol-relative references, and a blacklist discard heuristic
//! with a domain-slug override.

use url::Url;

/// Substrings signaling non-product imagery: trackers/pixels, banners/CTAs,
/// brand/logo/icon assets, trust badges/ratings/reviews, payment/guarantee/
/// shipping imagery, and generic placeholders.
const BLACKLIST: &[&str] = &[
    "pixel",
    "tracking",
    "tracker",
    "analytics",
    "beacon",
    "spacer",
    "blank",
    "1x1",
    "banner",
    "cta-",
    "-cta",
    "button",
    "logo",
    "icon",
    "favicon",
    "sprite",
    "badge",
    "trust",
    "seal",
    "rating",
    "stars",
    "review",
    "testimonial",
    "payment",
    "visa",
    "mastercard",
    "paypal",
    "amex",
    "guarantee",
    "money-back",
    "moneyback",
    "shipping",
    "delivery",
    "placeholder",
    "dummy",
    "sample",
    "default-image",
    "no-image",
    "noimage",
];

/// Normalize a possibly-relative image reference to absolute http(s) form.
///
/// Absolute http(s) URLs pass through unchanged. Relative and
/// protocol-relative references are resolved against `base`. Anything
/// unparsable or with a non-http(s) scheme yields `None`.
pub fn normalize_image_url(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    let resolved = Url::options().base_url(Some(base)).parse(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Lowercased first label of the product URL's hostname, `www.` stripped.
/// A weak product-identity signal used to override the blacklist.
pub fn domain_slug(product_url: &Url) -> Option<String> {
    let host = product_url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let first = host.split('.').next()?;
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Decide whether a candidate URL must be discarded.
///
/// The slug override is evaluated first: a URL containing the product's
/// domain slug is kept regardless of other matches, since the asset almost
/// certainly belongs to the product itself. After that, data-URIs, SVG
/// assets, and blacklist matches are discarded.
pub fn should_discard(url: &str, product_url: &Url) -> bool {
    let lower = url.to_ascii_lowercase();

    if let Some(slug) = domain_slug(product_url) {
        if lower.contains(&slug) {
            return false;
        }
    }

    if lower.starts_with("data:") {
        return true;
    }
    if is_svg(&lower) {
        return true;
    }
    BLACKLIST.iter().any(|pat| lower.contains(pat))
}

fn is_svg(lower_url: &str) -> bool {
    let path_end = lower_url
        .find(|c| c == '?' || c == '#')
        .unwrap_or(lower_url.len());
    lower_url[..path_end].ends_with(".svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://prodentim.com/offer/").unwrap()
    }

    #[test]
    fn test_normalize_absolute_passthrough() {
        let url = normalize_image_url("https://cdn.example.com/a.jpg", &base());
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_normalize_relative_and_protocol_relative() {
        assert_eq!(
            normalize_image_url("img/a.jpg", &base()).as_deref(),
            Some("https://prodentim.com/offer/img/a.jpg")
        );
        assert_eq!(
            normalize_image_url("/img/a.jpg", &base()).as_deref(),
            Some("https://prodentim.com/img/a.jpg")
        );
        assert_eq!(
            normalize_image_url("//cdn.example.com/a.jpg", &base()).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_normalize_rejects_malformed_and_non_http() {
        assert_eq!(normalize_image_url("", &base()), None);
        assert_eq!(normalize_image_url("   ", &base()), None);
        assert_eq!(normalize_image_url("javascript:void(0)", &base()), None);
    }

    #[test]
    fn test_domain_slug_strips_www() {
        let url = Url::parse("https://www.prodentim24.com/").unwrap();
        assert_eq!(domain_slug(&url).as_deref(), Some("prodentim24"));
    }

    #[test]
    fn test_discard_data_uri_and_svg() {
        assert!(should_discard("data:image/png;base64,AAAA", &base()));
        assert!(should_discard("https://x.com/art.svg", &base()));
        assert!(should_discard("https://x.com/art.svg?v=2", &base()));
        assert!(!should_discard("https://x.com/art.svg.jpg", &base()));
    }

    #[test]
    fn test_discard_blacklist_tokens() {
        assert!(should_discard("https://x.com/assets/trust-badge.png", &base()));
        assert!(should_discard("https://x.com/visa-mastercard.png", &base()));
        assert!(should_discard("https://x.com/img/pixel.gif", &base()));
        assert!(!should_discard("https://x.com/img/product-shot.jpg", &base()));
    }

    #[test]
    fn test_slug_override_suppresses_discard() {
        // "badge" is blacklisted, but the slug wins.
        assert!(should_discard("https://x.com/some-badge-2024.png", &base()));
        assert!(!should_discard(
            "https://x.com/prodentim-badge-2024.png",
            &base()
        ));
    }
}
