// src/scrapers/qut/mod.rs

//! QUT scraper.
//!
//! Unit outlines are a single document per unit and study period, so there
//! is no offering-table hop: the outline URL is built directly from the
//! unit code, year and period. Assessment items are not tabulated; they sit
//! in an anchored section as labelled blocks (a heading per item, with
//! "Weight:" and "Due:" lines underneath), which this module walks.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::{AppError, Result};
use crate::fetch::DocumentFetcher;
use crate::models::{
    AssessmentItem, CourseAssessment, HurdleInfo, QutConfig, SemesterSelection, SemesterType,
    Weight, canonical_course_code,
};
use crate::scrapers::CourseScraper;
use crate::utils::text::{hurdle_threshold, normalize_whitespace};
use crate::utils::{element_text, heading_level, next_sibling_elements, parse_selector};

fn weight_percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)weight\w*\s*:?\s*(\d{1,3}(?:\.\d+)?)\s*%").unwrap()
    })
}

fn weight_pass_fail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)weight\w*\s*:?\s*pass\s*/?\s*fail").unwrap())
}

fn due_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)due(?:\s*date)?\s*:\s*([^.:]{1,80})").unwrap())
}

fn hurdle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hurdle|threshold\s+assessment").unwrap())
}

/// Study-period code used in outline URLs.
fn period_code(semester: SemesterType) -> &'static str {
    match semester {
        SemesterType::Sem1 => "SEM-1",
        SemesterType::Sem2 => "SEM-2",
        SemesterType::Summer => "SUM",
    }
}

/// Scraper for QUT unit outlines.
pub struct QutScraper {
    fetcher: Arc<dyn DocumentFetcher>,
    config: QutConfig,
}

impl QutScraper {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: QutConfig) -> Self {
        Self { fetcher, config }
    }

    fn outline_url(&self, course: &str, selection: Option<&SemesterSelection>) -> String {
        // Outlines are per study period; with no selection the current year
        // and Semester 1 are assumed
        let (year, semester) = match selection {
            Some(sel) => (sel.year, sel.semester),
            None => (chrono::Utc::now().year(), SemesterType::Sem1),
        };
        self.config
            .outline_url
            .replace("{course}", course)
            .replace("{year}", &year.to_string())
            .replace("{semester}", period_code(semester))
    }
}

#[async_trait]
impl CourseScraper for QutScraper {
    async fn extract(
        &self,
        course: &str,
        selection: Option<SemesterSelection>,
    ) -> Result<CourseAssessment> {
        let course = canonical_course_code(course);
        let url = self.outline_url(&course, selection.as_ref());
        log::debug!("Outline for {course}: {url}");
        let html = self.fetcher.fetch(&url).await?;

        parse_outline(&course, selection, &url, &html)
    }
}

/// Parse the outline document. Synchronous; the DOM never crosses an await.
fn parse_outline(
    course: &str,
    selection: Option<SemesterSelection>,
    url: &str,
    html: &str,
) -> Result<CourseAssessment> {
    let document = Html::parse_document(html);

    let blocks = assessment_blocks(&document);
    if blocks.is_empty() {
        return Err(AppError::structure(format!(
            "assessment section in outline of {course}"
        )));
    }

    let items: Vec<AssessmentItem> = blocks
        .iter()
        .filter_map(|block| parse_block(block))
        .collect();
    if items.is_empty() {
        return Err(AppError::NoItemsParsed {
            course: course.to_string(),
        });
    }

    Ok(CourseAssessment {
        course_code: course.to_string(),
        title: unit_title(&document),
        items,
        semester: selection,
        course_profile_url: Some(url.to_string()),
        course_wide_hurdle_text: None,
    })
}

/// One candidate item: its heading text and the flattened text that follows
/// it up to the next heading.
#[derive(Debug)]
struct ItemBlock {
    name: String,
    body: String,
}

/// Collect item blocks from the assessment section.
///
/// The section is found in order by: an element with id `assessment`, a
/// named anchor `a[name="assessment"]`, and finally a heading whose text
/// mentions assessment. Within it, each sub-heading opens an item block
/// that runs until the next heading.
fn assessment_blocks(document: &Html) -> Vec<ItemBlock> {
    if let Some(region) = region_by_id(document).or_else(|| region_by_anchor(document)) {
        return blocks_in_region(&region);
    }
    blocks_after_heading(document)
}

fn region_by_id(document: &Html) -> Option<ElementRef<'_>> {
    let sel = parse_selector("#assessment").ok()?;
    document.select(&sel).next()
}

fn region_by_anchor(document: &Html) -> Option<ElementRef<'_>> {
    let sel = parse_selector(r#"a[name="assessment"]"#).ok()?;
    let anchor = document.select(&sel).next()?;
    anchor.parent().and_then(ElementRef::wrap)
}

/// Item blocks inside a container element: each h3-h5 opens a block whose
/// body is the text of following siblings up to the next heading.
fn blocks_in_region(region: &ElementRef) -> Vec<ItemBlock> {
    let Ok(heading_sel) = parse_selector("h3, h4, h5") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for heading in region.select(&heading_sel) {
        let name = element_text(&heading);
        if name.is_empty() {
            continue;
        }

        let mut parts = Vec::new();
        for sibling in next_sibling_elements(&heading) {
            if heading_level(&sibling).is_some() {
                break;
            }
            let text = element_text(&sibling);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        blocks.push(ItemBlock {
            name,
            body: normalize_whitespace(&parts.join(" ")),
        });
    }
    blocks
}

/// Fallback when the section is only marked by a heading: sibling
/// sub-headings after the "Assessment" heading open item blocks, and a
/// heading at the same or higher level closes the section.
fn blocks_after_heading(document: &Html) -> Vec<ItemBlock> {
    let Ok(heading_sel) = parse_selector("h1, h2, h3") else {
        return Vec::new();
    };

    let opener = document.select(&heading_sel).find(|heading| {
        element_text(heading).to_lowercase().contains("assessment")
    });
    let Some(opener) = opener else {
        return Vec::new();
    };
    let section_level = heading_level(&opener).unwrap_or(2);

    let mut blocks: Vec<ItemBlock> = Vec::new();
    for sibling in next_sibling_elements(&opener) {
        match heading_level(&sibling) {
            Some(level) if level <= section_level => break,
            Some(_) => {
                let name = element_text(&sibling);
                if !name.is_empty() {
                    blocks.push(ItemBlock {
                        name,
                        body: String::new(),
                    });
                }
            }
            None => {
                if let Some(block) = blocks.last_mut() {
                    let text = element_text(&sibling);
                    if !text.is_empty() {
                        if !block.body.is_empty() {
                            block.body.push(' ');
                        }
                        block.body.push_str(&text);
                    }
                }
            }
        }
    }
    for block in &mut blocks {
        block.body = normalize_whitespace(&block.body);
    }
    blocks
}

/// Parse a block into an item, or None to skip it.
///
/// The weight must be explicitly labelled; blocks without one (overview
/// prose, grading notes) are skipped rather than guessed at.
fn parse_block(block: &ItemBlock) -> Option<AssessmentItem> {
    let weight = if weight_pass_fail_re().is_match(&block.body) {
        Weight::PassFail
    } else {
        let captures = weight_percent_re().captures(&block.body)?;
        let value: f64 = captures[1].parse().ok()?;
        // Labelled weights outside (0, 100] are parse noise, not items
        if value <= 0.0 || value > 100.0 {
            return None;
        }
        Weight::Percentage(value)
    };

    let due_date = due_re()
        .captures(&block.body)
        .map(|c| c[1].trim().to_string())
        .filter(|text| !text.is_empty());

    let flagged = hurdle_re().is_match(&block.name) || hurdle_re().is_match(&block.body);
    let hurdle = flagged.then(|| {
        let threshold = hurdle_threshold(&block.body);
        let requirements = hurdle_requirement_sentence(&block.body);
        HurdleInfo::flagged(threshold, requirements)
    });

    Some(AssessmentItem {
        name: block.name.clone(),
        weight,
        due_date,
        hurdle,
    })
}

/// The first sentence of the block that mentions the hurdle, as the
/// requirement text. Outlines state the condition inline rather than in a
/// dedicated subsection.
fn hurdle_requirement_sentence(body: &str) -> Option<String> {
    body.split_inclusive('.')
        .map(str::trim)
        .find(|sentence| hurdle_re().is_match(sentence))
        .map(str::to_string)
}

fn unit_title(document: &Html) -> Option<String> {
    let sel = parse_selector("h1").ok()?;
    document
        .select(&sel)
        .map(|h| element_text(&h))
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliveryMode;

    struct StaticFetcher {
        html: String,
        last_url: std::sync::Mutex<Option<String>>,
    }

    impl StaticFetcher {
        fn new(html: &str) -> Self {
            Self {
                html: html.to_string(),
                last_url: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl DocumentFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            *self.last_url.lock().unwrap() = Some(url.to_string());
            Ok(self.html.clone())
        }
    }

    fn outline_html() -> &'static str {
        r#"<html><body>
        <h1>CAB201 Programming Principles</h1>
        <div id="assessment">
          <h2>Assessment</h2>
          <h3>Problem Solving Task</h3>
          <p>Weight: 40%</p>
          <p>Due: Week 7</p>
          <h3>Final Examination</h3>
          <p>Weight: 60%. This is a threshold assessment: you must achieve
             a pass threshold is 50% on the exam.</p>
          <p>Due: Central examination period</p>
          <h3>Grading notes</h3>
          <p>Grades are released via HiQ.</p>
        </div>
        </body></html>"#
    }

    #[tokio::test]
    async fn extracts_labelled_blocks() {
        let fetcher = Arc::new(StaticFetcher::new(outline_html()));
        let scraper = QutScraper::new(fetcher, QutConfig::default());
        let selection = SemesterSelection::new(2026, SemesterType::Sem1, DeliveryMode::Internal);

        let result = scraper.extract("cab201", Some(selection)).await.unwrap();
        assert_eq!(result.course_code, "CAB201");
        assert_eq!(result.title.as_deref(), Some("CAB201 Programming Principles"));
        assert_eq!(result.items.len(), 2);

        assert_eq!(result.items[0].name, "Problem Solving Task");
        assert_eq!(result.items[0].weight, Weight::Percentage(40.0));
        assert_eq!(result.items[0].due_date.as_deref(), Some("Week 7"));
        assert!(result.items[0].hurdle.is_none());

        let exam = &result.items[1];
        assert_eq!(exam.weight, Weight::Percentage(60.0));
        let hurdle = exam.hurdle.as_ref().unwrap();
        assert!(hurdle.is_hurdle);
        assert_eq!(hurdle.threshold, Some(50.0));
        assert!(hurdle.requirements.as_ref().unwrap().contains("threshold"));
    }

    #[tokio::test]
    async fn outline_url_carries_period_code() {
        let fetcher = Arc::new(StaticFetcher::new(outline_html()));
        let scraper = QutScraper::new(fetcher.clone(), QutConfig::default());
        let selection = SemesterSelection::new(2025, SemesterType::Sem2, DeliveryMode::Internal);

        scraper.extract("CAB201", Some(selection)).await.unwrap();
        let url = fetcher.last_url.lock().unwrap().clone().unwrap();
        assert!(url.contains("unitCode=CAB201"));
        assert!(url.contains("year=2025"));
        assert!(url.contains("period=SEM-2"));
    }

    #[tokio::test]
    async fn heading_fallback_without_anchored_region() {
        let html = r#"<html><body>
            <h1>CAB203 Discrete Structures</h1>
            <h2>Assessment details</h2>
            <h3>Quiz Portfolio</h3>
            <p>Weight: 30%</p>
            <p>Due: Weekly</p>
            <h3>Project</h3>
            <p>Weight: Pass/Fail. Due: Week 13.</p>
            <h2>Resources</h2>
            <h3>Textbook</h3>
            <p>Weight: none of this is assessment. 100% optional.</p>
            </body></html>"#;
        let fetcher = Arc::new(StaticFetcher::new(html));
        let scraper = QutScraper::new(fetcher, QutConfig::default());

        let result = scraper.extract("CAB203", None).await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].weight, Weight::Percentage(30.0));
        assert_eq!(result.items[1].weight, Weight::PassFail);
    }

    #[tokio::test]
    async fn missing_section_is_a_structure_error() {
        let fetcher = Arc::new(StaticFetcher::new(
            "<html><body><h1>CAB201</h1><p>Outline unavailable.</p></body></html>",
        ));
        let scraper = QutScraper::new(fetcher, QutConfig::default());
        let err = scraper.extract("CAB201", None).await.unwrap_err();
        assert!(matches!(err, AppError::StructureNotFound(_)));
    }

    #[tokio::test]
    async fn out_of_range_weights_are_dropped() {
        let html = r#"<html><body>
            <div id="assessment">
              <h3>Mega Project</h3>
              <p>Weight: 150%</p>
              <h3>Exam</h3>
              <p>Weight: 100%</p>
            </div>
            </body></html>"#;
        let fetcher = Arc::new(StaticFetcher::new(html));
        let scraper = QutScraper::new(fetcher, QutConfig::default());
        let result = scraper.extract("CAB201", None).await.unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Exam");
        assert_eq!(result.items[0].weight, Weight::Percentage(100.0));
    }

    #[tokio::test]
    async fn unlabelled_blocks_yield_no_items() {
        let html = r#"<html><body>
            <div id="assessment">
              <h3>Assessment overview</h3>
              <p>Details will be published closer to the start of semester.</p>
            </div>
            </body></html>"#;
        let fetcher = Arc::new(StaticFetcher::new(html));
        let scraper = QutScraper::new(fetcher, QutConfig::default());
        let err = scraper.extract("CAB201", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoItemsParsed { .. }));
    }
}
