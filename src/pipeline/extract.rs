// src/pipeline/extract.rs

use std::sync::Arc;

use crate::cache::{CacheKey, ScrapeCache};
use crate::error::{AppError, Result};
use crate::fetch::{DocumentFetcher, HttpFetcher};
use crate::models::{
    Config, CourseAssessment, DeliveryModeList, Institution, SemesterSelection, SemesterType,
    canonical_course_code,
};
use crate::scrapers::{UqScraper, scraper_for};

/// Extraction pipeline shared by the CLI and batch runs.
pub struct Pipeline {
    pub(crate) config: Config,
    cache: ScrapeCache,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl Pipeline {
    /// Build a pipeline with an HTTP fetcher and a config-driven cache.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config.scraper, config.relay.clone())?);
        let cache = ScrapeCache::from_config(&config.cache);
        Ok(Self::new(config, cache, fetcher))
    }

    pub fn new(config: Config, cache: ScrapeCache, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            config,
            cache,
            fetcher,
        }
    }

    /// Extract a course's assessment structure, cache-first.
    ///
    /// Keys memoized as failed short-circuit without touching the network;
    /// a durable upstream block memoizes the key so the next request does.
    pub async fn extract(
        &self,
        institution: Institution,
        course: &str,
        selection: Option<SemesterSelection>,
    ) -> Result<CourseAssessment> {
        let course = canonical_course_code(course);
        let key = CacheKey::scrape(institution, &course, selection);
        self.cache.record_request(&key).await;

        if self.cache.is_failed(&key).await {
            log::info!("Skipping {}: memoized as failed", key.derive());
            return Err(AppError::TemporarilyUnavailable);
        }
        if let Some(hit) = self.cache.get_assessment(&key).await {
            log::info!("Cache hit for {}", key.derive());
            return Ok(hit);
        }

        let scraper = scraper_for(institution, Arc::clone(&self.fetcher), &self.config);
        match scraper.extract(&course, selection).await {
            Ok(result) => {
                self.cache.put_assessment(&key, &result, None).await;
                Ok(result)
            }
            Err(e) => {
                if e.is_rate_limited() {
                    log::warn!("Memoizing failure for {}: {e}", key.derive());
                    self.cache.add_failed(&key).await;
                }
                Err(e)
            }
        }
    }

    /// List delivery modes for a course offering, cache-first.
    pub async fn list_deliveries(
        &self,
        institution: Institution,
        course: &str,
        year: i32,
        semester: SemesterType,
    ) -> Result<DeliveryModeList> {
        let course = canonical_course_code(course);
        let key = CacheKey::delivery(institution, &course, year, semester);
        self.cache.record_request(&key).await;

        if self.cache.is_failed(&key).await {
            return Err(AppError::TemporarilyUnavailable);
        }
        if let Some(hit) = self.cache.get_deliveries(&key).await {
            log::info!("Cache hit for {}", key.derive());
            return Ok(hit);
        }

        let result = match institution {
            Institution::Uq => {
                UqScraper::new(Arc::clone(&self.fetcher), self.config.uq.clone())
                    .list_deliveries(&course, year, semester)
                    .await
            }
            // Outlines are one document per delivery period; there is no
            // page enumerating modes to scrape
            Institution::Qut => Err(AppError::validation(
                "delivery-mode listing is not available for qut",
            )),
        };

        match result {
            Ok(list) => {
                self.cache.put_deliveries(&key, &list, None).await;
                Ok(list)
            }
            Err(e) => {
                if e.is_rate_limited() {
                    self.cache.add_failed(&key).await;
                }
                Err(e)
            }
        }
    }

    /// Delete cached entries whose embedded year precedes `cutoff_year`.
    pub async fn evict_stale(&self, cutoff_year: i32) -> crate::cache::EvictionSummary {
        self.cache.evict_stale(cutoff_year).await
    }

    pub fn cache(&self) -> &ScrapeCache {
        &self.cache
    }
}
