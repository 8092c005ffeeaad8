// src/error.rs

//! Unified error handling for the scraper application.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from a source document
    #[error("Fetch failed for {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required page structure (offering table, assessment table, column
    /// roles) could not be located
    #[error("Structure not found: {0}")]
    StructureNotFound(String),

    /// An assessment table was located but yielded no valid rows
    #[error("No assessment items parsed for {course}")]
    NoItemsParsed { course: String },

    /// Upstream rate limiting or fetch-quota exhaustion
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// A previous attempt for this key failed permanently; retry later
    #[error("Course data temporarily unavailable, retry later")]
    TemporarilyUnavailable,
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a structure-not-found error naming what was sought.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::StructureNotFound(message.into())
    }

    /// Whether this error signals a durable, non-retryable upstream block.
    ///
    /// Only this class is ever memoized in the failure set; structural and
    /// transport errors are retried on the next request.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Fetch { status, .. } => *status == 429,
            _ => false,
        }
    }
}

/// Classify raw fetch failure text against known quota/rate-limit phrases.
pub fn looks_rate_limited(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["rate limit", "too many requests", "quota", "credits"]
        .iter()
        .any(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_classification() {
        assert!(AppError::RateLimited("quota exhausted".into()).is_rate_limited());
        assert!(
            AppError::Fetch {
                url: "https://example.com".into(),
                status: 429,
            }
            .is_rate_limited()
        );
        assert!(!AppError::structure("assessment table").is_rate_limited());
        assert!(
            !AppError::NoItemsParsed {
                course: "CSSE1001".into(),
            }
            .is_rate_limited()
        );
    }

    #[test]
    fn fetch_text_classification() {
        assert!(looks_rate_limited("Too Many Requests"));
        assert!(looks_rate_limited("API credits exhausted"));
        assert!(!looks_rate_limited("404 not found"));
    }
}
