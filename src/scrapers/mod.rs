// src/scrapers/mod.rs

//! Institution scrapers.
//!
//! Each institution publishes assessment data in a completely different
//! page structure, so the scrapers are independent implementations of one
//! capability interface, selected by an `Institution` tag. They share only
//! the output shape and the cache contract.

pub mod qut;
pub mod uq;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::DocumentFetcher;
use crate::models::{Config, CourseAssessment, Institution, SemesterSelection};

pub use qut::QutScraper;
pub use uq::UqScraper;

/// Extracts the assessment structure of one course offering.
#[async_trait]
pub trait CourseScraper: Send + Sync {
    /// Run the full extraction pipeline for a course.
    ///
    /// All-or-nothing: either a `CourseAssessment` with at least one item,
    /// or an error. No partial result is ever returned.
    async fn extract(
        &self,
        course: &str,
        selection: Option<SemesterSelection>,
    ) -> Result<CourseAssessment>;
}

/// Build the scraper for an institution.
pub fn scraper_for(
    institution: Institution,
    fetcher: Arc<dyn DocumentFetcher>,
    config: &Config,
) -> Box<dyn CourseScraper> {
    match institution {
        Institution::Uq => Box::new(UqScraper::new(fetcher, config.uq.clone())),
        Institution::Qut => Box::new(QutScraper::new(fetcher, config.qut.clone())),
    }
}
