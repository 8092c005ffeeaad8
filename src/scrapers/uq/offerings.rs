// src/scrapers/uq/offerings.rs

//! Course-offering locator.
//!
//! The course page lists offerings in up to two tables (current and
//! archived), each row carrying a semester/year cell, a location cell, a
//! delivery-mode cell, and a link to that offering's profile document.
//! Matching is pure text work: semester by alias substring, year by exact
//! 4-digit substring, delivery by substring classification.

use scraper::{ElementRef, Html};

use crate::error::{AppError, Result};
use crate::models::{DeliveryMode, SemesterSelection, SemesterType};
use crate::utils::{element_text, parse_selector};

const CURRENT_TABLE: &str = "table#course-current-offerings";
const ARCHIVED_TABLE: &str = "table#course-archived-offerings";

/// One offering row, already classified.
#[derive(Debug, Clone)]
pub struct OfferingRow {
    pub semester_text: String,
    pub delivery: Option<DeliveryMode>,
    pub profile_href: Option<String>,
}

impl OfferingRow {
    fn matches(&self, selection: &SemesterSelection) -> bool {
        self.semester_text.contains(&selection.year.to_string())
            && selection.semester.matches_text(&self.semester_text)
            && self.delivery == Some(selection.delivery)
    }
}

fn parse_row(row: &ElementRef) -> Option<OfferingRow> {
    let cells: Vec<ElementRef> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect();
    if cells.len() < 2 {
        return None;
    }

    // Header rows are all-th
    if cells.iter().all(|cell| cell.value().name() == "th") {
        return None;
    }

    let semester_text = element_text(&cells[0]);
    if semester_text.is_empty() {
        return None;
    }

    // Delivery mode sits in its own cell, but older pages fold it into the
    // location cell, so classify every cell after the first.
    let delivery = cells[1..]
        .iter()
        .find_map(|cell| DeliveryMode::classify(&element_text(cell)));

    let link_sel = parse_selector("a[href]").ok()?;
    let profile_href = row
        .select(&link_sel)
        .find(|a| {
            let href = a.value().attr("href").unwrap_or("");
            let class = a.value().attr("class").unwrap_or("");
            href.contains("course-profiles") || class.contains("profile")
        })
        .or_else(|| {
            // Last-cell link as fallback; the profile link is the only one
            // in an offering row on every layout seen so far
            cells.last().and_then(|cell| cell.select(&link_sel).next())
        })
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.to_string());

    Some(OfferingRow {
        semester_text,
        delivery,
        profile_href,
    })
}

fn table_rows<'a>(document: &'a Html, table_selector: &str) -> Option<Vec<OfferingRow>> {
    let sel = parse_selector(table_selector).ok()?;
    let table = document.select(&sel).next()?;

    let body_sel = parse_selector("tbody tr").ok()?;
    let mut candidates: Vec<ElementRef> = table.select(&body_sel).collect();
    if candidates.is_empty() {
        let any_sel = parse_selector("tr").ok()?;
        candidates = table.select(&any_sel).collect();
    }

    Some(candidates.iter().filter_map(parse_row).collect())
}

/// Locate the profile link for the requested offering.
///
/// Search order: current-offerings table first, archived second, first
/// matching row in document order wins. With no selector the first current
/// row is taken as the default offering.
pub fn locate_offering(
    document: &Html,
    course: &str,
    selection: Option<&SemesterSelection>,
) -> Result<String> {
    let current = table_rows(document, CURRENT_TABLE);
    let archived = table_rows(document, ARCHIVED_TABLE);

    if current.is_none() && archived.is_none() {
        return Err(AppError::structure(format!(
            "no offering tables found for {course}"
        )));
    }

    let current = current.unwrap_or_default();
    let archived = archived.unwrap_or_default();

    let matched = match selection {
        Some(sel) => current
            .iter()
            .chain(archived.iter())
            .find(|row| row.matches(sel))
            .ok_or_else(|| {
                AppError::structure(format!(
                    "no offering of {course} for {}",
                    sel.describe()
                ))
            })?,
        // Documented simplification: no selector means the first current
        // offering.
        None => current.first().or_else(|| archived.first()).ok_or_else(|| {
            AppError::structure(format!("no offerings listed for {course}"))
        })?,
    };

    matched.profile_href.clone().ok_or_else(|| {
        AppError::structure(format!("offering of {course} has no profile link"))
    })
}

/// Distinct delivery modes offered for a year and semester, in row order.
pub fn list_delivery_modes(
    document: &Html,
    year: i32,
    semester: SemesterType,
) -> Vec<DeliveryMode> {
    let mut modes = Vec::new();
    for table in [CURRENT_TABLE, ARCHIVED_TABLE] {
        for row in table_rows(document, table).unwrap_or_default() {
            if !row.semester_text.contains(&year.to_string())
                || !semester.matches_text(&row.semester_text)
            {
                continue;
            }
            if let Some(mode) = row.delivery {
                if !modes.contains(&mode) {
                    modes.push(mode);
                }
            }
        }
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemesterSelection;

    fn offerings_page() -> Html {
        Html::parse_document(
            r#"
            <html><body>
            <h2>Current offerings</h2>
            <table id="course-current-offerings">
              <thead><tr><th>Semester</th><th>Location</th><th>Mode</th><th>Profile</th></tr></thead>
              <tbody>
                <tr>
                  <td>Semester 2, 2025</td><td>St Lucia</td><td>External</td>
                  <td><a class="profile-available" href="/course-profiles/101">Profile</a></td>
                </tr>
                <tr>
                  <td>Semester 1, 2025</td><td>St Lucia</td><td>In Person</td>
                  <td><a class="profile-available" href="/course-profiles/102">Profile</a></td>
                </tr>
              </tbody>
            </table>
            <h2>Archived offerings</h2>
            <table id="course-archived-offerings">
              <tbody>
                <tr>
                  <td>Semester 2, 2023</td><td>St Lucia</td><td>Internal</td>
                  <td><a href="/course-profiles/90">Profile</a></td>
                </tr>
              </tbody>
            </table>
            </body></html>"#,
        )
    }

    #[test]
    fn selector_matches_first_qualifying_row_only() {
        let doc = offerings_page();
        let sel = SemesterSelection::new(2025, SemesterType::Sem2, DeliveryMode::External);
        let href = locate_offering(&doc, "CSSE1001", Some(&sel)).unwrap();
        assert_eq!(href, "/course-profiles/101");
    }

    #[test]
    fn archived_table_is_searched_after_current() {
        let doc = offerings_page();
        let sel = SemesterSelection::new(2023, SemesterType::Sem2, DeliveryMode::Internal);
        let href = locate_offering(&doc, "CSSE1001", Some(&sel)).unwrap();
        assert_eq!(href, "/course-profiles/90");
    }

    #[test]
    fn no_selector_defaults_to_first_current_row() {
        let doc = offerings_page();
        let href = locate_offering(&doc, "CSSE1001", None).unwrap();
        assert_eq!(href, "/course-profiles/101");
    }

    #[test]
    fn missing_tables_vs_no_matching_row() {
        let empty = Html::parse_document("<html><body><p>No such course</p></body></html>");
        let err = locate_offering(&empty, "CSSE1001", None).unwrap_err();
        assert!(err.to_string().contains("no offering tables"));

        let doc = offerings_page();
        let sel = SemesterSelection::new(2019, SemesterType::Sem1, DeliveryMode::Internal);
        let err = locate_offering(&doc, "CSSE1001", Some(&sel)).unwrap_err();
        assert!(err.to_string().contains("Semester 1, 2019"));
    }

    #[test]
    fn delivery_modes_for_semester() {
        let doc = offerings_page();
        assert_eq!(
            list_delivery_modes(&doc, 2025, SemesterType::Sem2),
            vec![DeliveryMode::External]
        );
        assert_eq!(
            list_delivery_modes(&doc, 2025, SemesterType::Sem1),
            vec![DeliveryMode::Internal]
        );
        assert!(list_delivery_modes(&doc, 2020, SemesterType::Sem1).is_empty());
    }
}
