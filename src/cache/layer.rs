// src/cache/layer.rs

//! Best-effort cache facade over a `CacheStore`.
//!
//! Every operation swallows backend errors and degrades to a miss or a
//! no-op: a cache outage must never fail an extraction request. Absence of
//! cache configuration is the typed `disabled` state, not a null handle.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheKey, CacheStore, DELIVERY_PREFIX, SCRAPE_PREFIX, embedded_key_year};
use crate::models::{CacheConfig, CourseAssessment, DeliveryModeList};

/// Set of keys whose extraction failed in a durable, non-retryable way.
const FAILED_SET: &str = "failed_scrapes";

/// Counter of extraction requests served.
const REQUEST_COUNTER: &str = "scrape_requests";

/// Bounded list of recently requested keys.
const RECENT_LIST: &str = "recent_requests";
const RECENT_LIST_LEN: i64 = 50;

/// Batch size for eviction deletes.
const EVICT_BATCH: usize = 100;

/// Outcome of a stale-year eviction run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvictionSummary {
    pub scanned: usize,
    pub deleted: usize,
    pub memo_removed: usize,
}

/// Cache layer shared by all institution pipelines.
#[derive(Clone)]
pub struct ScrapeCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl ScrapeCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A cache that satisfies every call as a miss/no-op.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Build from configuration: a file-backed store when a root directory
    /// is set, otherwise disabled.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled() {
            Self::new(Arc::new(crate::cache::LocalStore::new(&config.root_dir)))
        } else {
            log::info!("Cache disabled (no cache.root_dir configured)");
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = match store.get(&key.derive()).await {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Cache get failed for {}: {e}", key.derive());
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Cache entry for {} is unreadable: {e}", key.derive());
                None
            }
        }
    }

    async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Option<Duration>) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Cache serialize failed for {}: {e}", key.derive());
                return;
            }
        };
        if let Err(e) = store.set(&key.derive(), &raw, ttl).await {
            log::warn!("Cache set failed for {}: {e}", key.derive());
        }
    }

    /// Cached extraction for a key, if any.
    pub async fn get_assessment(&self, key: &CacheKey) -> Option<CourseAssessment> {
        self.get_json(key).await
    }

    /// Store an extraction. No expiry by default: a published semester's
    /// data is immutable, and re-fetching spends external quota.
    pub async fn put_assessment(
        &self,
        key: &CacheKey,
        value: &CourseAssessment,
        ttl: Option<Duration>,
    ) {
        self.put_json(key, value, ttl).await;
    }

    /// Cached delivery-mode lookup for a key, if any.
    pub async fn get_deliveries(&self, key: &CacheKey) -> Option<DeliveryModeList> {
        self.get_json(key).await
    }

    pub async fn put_deliveries(
        &self,
        key: &CacheKey,
        value: &DeliveryModeList,
        ttl: Option<Duration>,
    ) {
        self.put_json(key, value, ttl).await;
    }

    /// Whether this key is memoized as permanently failing.
    ///
    /// Backend errors read as "not memoized" so a cache outage cannot block
    /// extraction attempts.
    pub async fn is_failed(&self, key: &CacheKey) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.set_is_member(FAILED_SET, &key.derive()).await {
            Ok(memoized) => memoized,
            Err(e) => {
                log::warn!("Failure-memo check failed for {}: {e}", key.derive());
                false
            }
        }
    }

    /// Memoize a durable extraction failure for this key.
    pub async fn add_failed(&self, key: &CacheKey) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.set_add(FAILED_SET, &key.derive()).await {
            log::warn!("Failure-memo write failed for {}: {e}", key.derive());
        }
    }

    /// Best-effort request bookkeeping: a request counter and a bounded
    /// recently-requested list.
    pub async fn record_request(&self, key: &CacheKey) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.increment(REQUEST_COUNTER).await {
            log::warn!("Request counter increment failed: {e}");
        }
        if let Err(e) = store.list_append(RECENT_LIST, &key.derive()).await {
            log::warn!("Recent-request append failed: {e}");
            return;
        }
        if let Err(e) = store.list_trim(RECENT_LIST, -RECENT_LIST_LEN, -1).await {
            log::warn!("Recent-request trim failed: {e}");
        }
    }

    /// Delete all scrape/delivery keys whose embedded year is strictly less
    /// than `cutoff_year`, removing matching failure memos as well. Keys
    /// without a parseable year are never touched.
    pub async fn evict_stale(&self, cutoff_year: i32) -> EvictionSummary {
        let Some(store) = self.store.as_ref() else {
            return EvictionSummary::default();
        };

        let mut summary = EvictionSummary::default();
        for pattern in [format!("{SCRAPE_PREFIX}:*"), format!("{DELIVERY_PREFIX}:*")] {
            let mut cursor = 0;
            let mut stale = Vec::new();
            loop {
                let (next, keys) = match store.scan(cursor, &pattern, EVICT_BATCH).await {
                    Ok(page) => page,
                    Err(e) => {
                        log::warn!("Eviction scan failed for {pattern}: {e}");
                        break;
                    }
                };
                summary.scanned += keys.len();
                stale.extend(
                    keys.into_iter()
                        .filter(|k| embedded_key_year(k).is_some_and(|year| year < cutoff_year)),
                );
                if next == 0 {
                    break;
                }
                cursor = next;
            }

            for batch in stale.chunks(EVICT_BATCH) {
                match store.delete(batch).await {
                    Ok(deleted) => summary.deleted += deleted,
                    Err(e) => log::warn!("Eviction delete failed: {e}"),
                }
                match store.set_remove(FAILED_SET, batch).await {
                    Ok(removed) => summary.memo_removed += removed,
                    Err(e) => log::warn!("Eviction memo cleanup failed: {e}"),
                }
            }
        }

        log::info!(
            "Eviction complete: scanned {}, deleted {}, memo removed {}",
            summary.scanned,
            summary.deleted,
            summary.memo_removed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::models::{
        DeliveryMode, Institution, SemesterSelection, SemesterType, Weight,
    };
    use crate::models::{AssessmentItem, CourseAssessment};

    fn cache() -> (Arc<MemoryStore>, ScrapeCache) {
        let store = Arc::new(MemoryStore::new());
        (Arc::clone(&store), ScrapeCache::new(store))
    }

    fn sample_key(year: i32) -> CacheKey {
        CacheKey::scrape(
            Institution::Uq,
            "CSSE1001",
            Some(SemesterSelection::new(
                year,
                SemesterType::Sem1,
                DeliveryMode::Internal,
            )),
        )
    }

    fn sample_assessment() -> CourseAssessment {
        CourseAssessment {
            course_code: "CSSE1001".to_string(),
            title: None,
            items: vec![AssessmentItem {
                name: "Final Exam".to_string(),
                weight: Weight::Percentage(60.0),
                due_date: Some("Examination Period".to_string()),
                hurdle: None,
            }],
            semester: None,
            course_profile_url: None,
            course_wide_hurdle_text: None,
        }
    }

    #[tokio::test]
    async fn assessment_round_trip() {
        let (_, cache) = cache();
        let key = sample_key(2026);
        let value = sample_assessment();

        assert!(cache.get_assessment(&key).await.is_none());
        cache.put_assessment(&key, &value, None).await;
        assert_eq!(cache.get_assessment(&key).await, Some(value));
    }

    #[tokio::test]
    async fn disabled_cache_is_all_misses() {
        let cache = ScrapeCache::disabled();
        let key = sample_key(2026);
        assert!(!cache.is_enabled());
        cache.put_assessment(&key, &sample_assessment(), None).await;
        assert!(cache.get_assessment(&key).await.is_none());
        assert!(!cache.is_failed(&key).await);
        assert_eq!(cache.evict_stale(2030).await, EvictionSummary::default());
    }

    #[tokio::test]
    async fn failure_memo_round_trip() {
        let (_, cache) = cache();
        let key = sample_key(2026);
        assert!(!cache.is_failed(&key).await);
        cache.add_failed(&key).await;
        assert!(cache.is_failed(&key).await);
    }

    #[tokio::test]
    async fn eviction_respects_year_boundary() {
        let (_, cache) = cache();
        let current = 2026;
        let cutoff = current - 1;

        for year in [current - 3, current - 2, current - 1, current] {
            cache
                .put_assessment(&sample_key(year), &sample_assessment(), None)
                .await;
        }
        cache.add_failed(&sample_key(current - 3)).await;

        let summary = cache.evict_stale(cutoff).await;
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.memo_removed, 1);

        assert!(cache.get_assessment(&sample_key(current - 3)).await.is_none());
        assert!(cache.get_assessment(&sample_key(current - 2)).await.is_none());
        assert!(cache.get_assessment(&sample_key(current - 1)).await.is_some());
        assert!(cache.get_assessment(&sample_key(current)).await.is_some());
        assert!(!cache.is_failed(&sample_key(current - 3)).await);
    }

    #[tokio::test]
    async fn eviction_skips_keys_without_years() {
        let (_, cache) = cache();
        let bare = CacheKey::scrape(Institution::Uq, "CSSE1001", None);
        cache.put_assessment(&bare, &sample_assessment(), None).await;

        let summary = cache.evict_stale(2100).await;
        assert_eq!(summary.deleted, 0);
        assert!(cache.get_assessment(&bare).await.is_some());
    }

    #[tokio::test]
    async fn record_request_bounds_recent_list() {
        let (store, cache) = cache();
        for _ in 0..60 {
            cache.record_request(&sample_key(2026)).await;
        }
        let recent = store.list_range("recent_requests", 0, -1).await.unwrap();
        assert_eq!(recent.len(), 50);
        assert_eq!(store.increment("scrape_requests").await.unwrap(), 61);
    }
}
