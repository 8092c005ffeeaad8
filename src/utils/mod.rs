//! Utility functions and helpers.

pub mod dom;
pub mod text;

pub use dom::{element_text, heading_level, next_sibling_elements, parse_selector};
pub use text::normalize_whitespace;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.edu/programs/").unwrap();
        assert_eq!(
            resolve_url(&base, "course.html"),
            "https://example.edu/programs/course.html"
        );
        assert_eq!(
            resolve_url(&base, "/profiles/1234"),
            "https://example.edu/profiles/1234"
        );
        assert_eq!(
            resolve_url(&base, "https://other.edu/x"),
            "https://other.edu/x"
        );
    }
}
