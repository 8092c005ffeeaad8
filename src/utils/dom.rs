// src/utils/dom.rs

//! DOM traversal helpers shared by the institution scrapers.

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::utils::text::normalize_whitespace;

/// Parse a CSS selector string into a `Selector`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collected, whitespace-normalized text content of an element.
pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Following sibling elements of `element`, in document order.
pub fn next_sibling_elements<'a>(
    element: &ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Heading level for h1..h6 elements, None otherwise.
pub fn heading_level(element: &ElementRef) -> Option<u8> {
    match element.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}
