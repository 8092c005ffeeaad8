// src/cache/mod.rs

//! Cache and idempotency layer.
//!
//! Extraction results are keyed by (institution, course, year, semester,
//! delivery) and stored without expiry by default: a published semester's
//! assessment structure never changes, and re-fetching spends a constrained
//! external fetch quota. A separate failure-memo set records keys whose
//! extraction failed in a durable, non-retryable way.

pub mod key;
pub mod layer;
pub mod local;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use key::{CacheKey, DELIVERY_PREFIX, SCRAPE_PREFIX, embedded_key_year, semester_token};
pub use layer::{EvictionSummary, ScrapeCache};
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Atomic key-value store primitives the cache layer is built on.
///
/// All operations are individually atomic; the layer never does
/// read-modify-write on a single key outside these primitives.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, None on missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with an optional expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Delete keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize>;

    /// All keys matching a glob-style pattern (trailing `*` supported).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Cursor-based scan over keys matching a pattern. A returned cursor of
    /// 0 means the scan is complete.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)>;

    /// Add a member to a set.
    async fn set_add(&self, set: &str, member: &str) -> Result<()>;

    /// Set membership test.
    async fn set_is_member(&self, set: &str, member: &str) -> Result<bool>;

    /// Remove members from a set, returning how many were present.
    async fn set_remove(&self, set: &str, members: &[String]) -> Result<usize>;

    /// Append to the tail of a list.
    async fn list_append(&self, list: &str, value: &str) -> Result<()>;

    /// Trim a list to the inclusive range [start, stop]; negative indices
    /// count from the tail.
    async fn list_trim(&self, list: &str, start: i64, stop: i64) -> Result<()>;

    /// Read the inclusive range [start, stop] of a list.
    async fn list_range(&self, list: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Atomically increment a counter, returning the new value.
    async fn increment(&self, key: &str) -> Result<i64>;
}

/// Glob-style key matching: literal match, with a trailing `*` matching any
/// suffix.
pub(crate) fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

/// Resolve possibly negative list indices against a length, redis-style.
pub(crate) fn resolve_list_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let clamp = |i: i64| -> i64 {
        if i < 0 { (len + i).max(0) } else { i.min(len - 1) }
    };
    if len == 0 {
        return None;
    }
    let start = clamp(start);
    let stop = clamp(stop);
    if start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matching() {
        assert!(pattern_matches("scrape:*", "scrape:uq:CSSE1001"));
        assert!(pattern_matches("scrape:uq:CSSE1001", "scrape:uq:CSSE1001"));
        assert!(!pattern_matches("delivery:*", "scrape:uq:CSSE1001"));
        assert!(!pattern_matches("scrape:uq:CSSE1001", "scrape:uq:CSSE1002"));
    }

    #[test]
    fn list_range_resolution() {
        assert_eq!(resolve_list_range(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve_list_range(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve_list_range(5, 3, 1), None);
        assert_eq!(resolve_list_range(0, 0, -1), None);
        assert_eq!(resolve_list_range(5, 0, 99), Some((0, 4)));
    }
}
