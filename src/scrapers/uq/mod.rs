// src/scrapers/uq/mod.rs

//! UQ scraper.
//!
//! Driven by the course page's offering tables: locate the requested
//! offering, follow its link to the profile document, then run the
//! table-locator cascade, column-role resolution, row parsing and
//! hurdle-text mining over that document.

pub mod hurdles;
pub mod offerings;
pub mod rows;
pub mod table;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::fetch::DocumentFetcher;
use crate::models::{
    CourseAssessment, DeliveryModeList, SemesterSelection, SemesterType, UqConfig,
    canonical_course_code,
};
use crate::scrapers::CourseScraper;
use crate::utils::{element_text, parse_selector, resolve_url};

/// Scraper for UQ course profiles.
pub struct UqScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    config: UqConfig,
}

impl UqScraper {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: UqConfig) -> Self {
        Self { fetcher, config }
    }

    fn offerings_url(&self, course: &str) -> String {
        self.config.offerings_url.replace("{course}", course)
    }

    /// Delivery modes offered for a course in one semester.
    pub async fn list_deliveries(
        &self,
        course: &str,
        year: i32,
        semester: SemesterType,
    ) -> Result<DeliveryModeList> {
        let course = canonical_course_code(course);
        let html = self.fetcher.fetch(&self.offerings_url(&course)).await?;

        let document = Html::parse_document(&html);
        let modes = offerings::list_delivery_modes(&document, year, semester);
        if modes.is_empty() {
            return Err(AppError::structure(format!(
                "no offerings of {course} found for {} {year}",
                semester.label()
            )));
        }
        Ok(DeliveryModeList {
            course_code: course,
            year,
            modes,
        })
    }

    /// Parse the profile document into an assessment record. Synchronous:
    /// the parsed DOM must not be held across awaits.
    fn parse_profile(
        course: &str,
        selection: Option<SemesterSelection>,
        profile_url: &str,
        html: &str,
    ) -> Result<CourseAssessment> {
        let document = Html::parse_document(html);

        let table = table::locate_assessment_table(&document).ok_or_else(|| {
            AppError::structure(format!("assessment table in profile of {course}"))
        })?;
        let roles = table::resolve_columns(&table);

        let mut items: Vec<_> = table::body_rows(&table)
            .iter()
            .filter_map(|row| rows::parse_row(row, &roles))
            .collect();
        if items.is_empty() {
            return Err(AppError::NoItemsParsed {
                course: course.to_string(),
            });
        }

        // Per-item hurdle detail; finding requirement text implies the item
        // is a hurdle even when the table row carried no marker
        for (index, item) in items.iter_mut().enumerate() {
            let Some(text) = hurdles::item_requirements(&document, index, &item.name) else {
                continue;
            };
            let mined_threshold = crate::utils::text::hurdle_threshold(&text);
            match item.hurdle.as_mut() {
                Some(info) => {
                    info.requirements = Some(text);
                    if info.threshold.is_none() {
                        info.threshold = mined_threshold;
                    }
                }
                None => {
                    item.hurdle = Some(crate::models::HurdleInfo::flagged(
                        mined_threshold,
                        Some(text),
                    ));
                }
            }
        }

        Ok(CourseAssessment {
            course_code: course.to_string(),
            title: course_title(&document),
            items,
            semester: selection,
            course_profile_url: Some(profile_url.to_string()),
            course_wide_hurdle_text: hurdles::course_wide_hurdle_text(&document),
        })
    }
}

fn course_title(document: &Html) -> Option<String> {
    let sel = parse_selector("h1").ok()?;
    document
        .select(&sel)
        .map(|h| element_text(&h))
        .find(|text| !text.is_empty())
}

#[async_trait]
impl CourseScraper for UqScraper {
    async fn extract(
        &self,
        course: &str,
        selection: Option<SemesterSelection>,
    ) -> Result<CourseAssessment> {
        let course = canonical_course_code(course);
        let offerings_url = self.offerings_url(&course);
        let offerings_html = self.fetcher.fetch(&offerings_url).await?;

        let profile_href = {
            let document = Html::parse_document(&offerings_html);
            offerings::locate_offering(&document, &course, selection.as_ref())?
        };
        let profile_url = match Url::parse(&offerings_url) {
            Ok(base) => resolve_url(&base, &profile_href),
            Err(_) => profile_href,
        };

        log::debug!("Profile for {course}: {profile_url}");
        let profile_html = self.fetcher.fetch(&profile_url).await?;

        Self::parse_profile(&course, selection, &profile_url, &profile_html)
    }
}
