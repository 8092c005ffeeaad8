//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Scraping-relay settings (empty api_key disables the relay)
    #[serde(default)]
    pub relay: RelayConfig,

    /// Cache backend settings (empty root_dir disables the cache)
    #[serde(default)]
    pub cache: CacheConfig,

    /// UQ source URLs
    #[serde(default)]
    pub uq: UqConfig,

    /// QUT source URLs
    #[serde(default)]
    pub qut: QutConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if !self.relay.api_key.is_empty() && self.relay.endpoint.trim().is_empty() {
            return Err(AppError::validation(
                "relay.endpoint must be set when relay.api_key is set",
            ));
        }
        if !self.uq.offerings_url.contains("{course}") {
            return Err(AppError::validation(
                "uq.offerings_url must contain a {course} placeholder",
            ));
        }
        if !self.qut.outline_url.contains("{course}") {
            return Err(AppError::validation(
                "qut.outline_url must contain a {course} placeholder",
            ));
        }
        Ok(())
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in batch runs, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Scraping-relay settings.
///
/// When an API key is present, document fetches are routed through the relay
/// endpoint with the target URL passed as a query parameter. Used when the
/// source site blocks direct requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay endpoint base URL
    #[serde(default = "defaults::relay_endpoint")]
    pub endpoint: String,

    /// Relay API key; empty disables the relay
    #[serde(default)]
    pub api_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::relay_endpoint(),
            api_key: String::new(),
        }
    }
}

impl RelayConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Cache backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Root directory for the file-backed store; empty disables caching
    #[serde(default)]
    pub root_dir: String,
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        !self.root_dir.is_empty()
    }
}

/// UQ source URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UqConfig {
    /// Course page listing current and archived offerings;
    /// `{course}` is replaced with the upper-cased course code
    #[serde(default = "defaults::uq_offerings_url")]
    pub offerings_url: String,
}

impl Default for UqConfig {
    fn default() -> Self {
        Self {
            offerings_url: defaults::uq_offerings_url(),
        }
    }
}

/// QUT source URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QutConfig {
    /// Unit outline page; `{course}`, `{year}` and `{semester}` are replaced
    #[serde(default = "defaults::qut_outline_url")]
    pub outline_url: String,
}

impl Default for QutConfig {
    fn default() -> Self {
        Self {
            outline_url: defaults::qut_outline_url(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; coursescan/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1500
    }
    pub fn relay_endpoint() -> String {
        "https://api.scraperapi.com/".into()
    }
    pub fn uq_offerings_url() -> String {
        "https://my.uq.edu.au/programs-courses/course.html?course_code={course}".into()
    }
    pub fn qut_outline_url() -> String {
        "https://www.qut.edu.au/study/unit?unitCode={course}&year={year}&period={semester}".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_key_without_endpoint() {
        let mut config = Config::default();
        config.relay.api_key = "secret".to_string();
        config.relay.endpoint = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn relay_disabled_without_key() {
        let config = Config::default();
        assert!(!config.relay.enabled());
        assert!(!config.cache.enabled());
    }

    #[test]
    fn load_or_default_survives_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert!(config.validate().is_ok());
    }
}
