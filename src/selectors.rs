//! Shared Selectors

use once_cell::sync::Lazy;
use scraper::Selector;

/// Selector for image elements, in document order.
pub static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("valid img selector"));

/// Selector for metadata tags with name/property attributes.
pub static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[name], meta[property]").expect("valid metadata selector"));
