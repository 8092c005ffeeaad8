// src/scrapers/uq/table.rs

//! Assessment-table locator and column-role resolver.
//!
//! Profile pages have no stable markup contract, so the locator is an
//! ordered cascade of pure `&Html -> Option<table>` strategies with
//! first-success-wins semantics: heading adjacency, then header keywords,
//! then content shape. A later stage runs only when every earlier stage
//! produced nothing.

use scraper::{ElementRef, Html};

use crate::utils::text::contains_percentage;
use crate::utils::{element_text, next_sibling_elements, parse_selector};

/// Resolved semantic roles of table columns, by cell index.
///
/// Absent roles fall back to row-level heuristics in the row parser.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub name: Option<usize>,
    pub weight: Option<usize>,
    pub due: Option<usize>,
}

/// Locate the table enumerating assessment items.
pub fn locate_assessment_table(document: &Html) -> Option<ElementRef<'_>> {
    let strategies: [fn(&Html) -> Option<ElementRef<'_>>; 3] = [
        by_heading_adjacency,
        by_header_keywords,
        by_content_shape,
    ];
    strategies.iter().find_map(|locate| locate(document))
}

/// Stage 1: first table following an "assessment" heading (levels 1-5),
/// either as a later sibling or nested in the next sibling container.
fn by_heading_adjacency(document: &Html) -> Option<ElementRef<'_>> {
    let heading_sel = parse_selector("h1, h2, h3, h4, h5").ok()?;
    let table_sel = parse_selector("table").ok()?;

    for heading in document.select(&heading_sel) {
        if !element_text(&heading).to_lowercase().contains("assessment") {
            continue;
        }

        let siblings: Vec<ElementRef> = next_sibling_elements(&heading).collect();
        if let Some(table) = siblings
            .iter()
            .find(|el| el.value().name() == "table")
        {
            return Some(*table);
        }
        if let Some(container) = siblings.first() {
            if let Some(table) = container.select(&table_sel).next() {
                return Some(table);
            }
        }
    }
    None
}

/// Stage 2: a table whose header cells mention assessment/item and
/// weight/%. Among qualifiers, one that also carries a due/date keyword is
/// preferred; otherwise the first in document order wins.
fn by_header_keywords(document: &Html) -> Option<ElementRef<'_>> {
    let table_sel = parse_selector("table").ok()?;

    let mut first_qualifier = None;
    for table in document.select(&table_sel) {
        let header: String = header_cells(&table)
            .iter()
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let names_items = header.contains("assessment") || header.contains("item");
        let names_weight = header.contains("weight") || header.contains('%');
        if !(names_items && names_weight) {
            continue;
        }
        if header.contains("due") || header.contains("date") {
            return Some(table);
        }
        if first_qualifier.is_none() {
            first_qualifier = Some(table);
        }
    }
    first_qualifier
}

/// Stage 3: a table whose first few body rows contain a percentage-shaped
/// cell.
fn by_content_shape(document: &Html) -> Option<ElementRef<'_>> {
    const PROBE_ROWS: usize = 3;
    let table_sel = parse_selector("table").ok()?;

    for table in document.select(&table_sel) {
        let percentish = body_rows(&table)
            .into_iter()
            .take(PROBE_ROWS)
            .flat_map(|row| row_cells(&row))
            .any(|cell| contains_percentage(&element_text(&cell)));
        if percentish {
            return Some(table);
        }
    }
    None
}

/// Map header text to column roles.
///
/// Roles are tried per cell in row order: name first, then weight, then
/// due. The first cell matching a role's keywords wins it, and a cell
/// serves at most one role.
pub fn resolve_columns(table: &ElementRef) -> ColumnRoles {
    let mut roles = ColumnRoles::default();

    for (index, cell) in header_cells(table).iter().enumerate() {
        let text = element_text(cell).to_lowercase();
        if text.is_empty() {
            continue;
        }

        if roles.name.is_none()
            && (text.contains("assessment task") || text.contains("assessment"))
        {
            roles.name = Some(index);
        } else if roles.weight.is_none()
            && (text.contains("weight") || text.contains("weighting"))
        {
            roles.weight = Some(index);
        } else if roles.due.is_none() && (text.contains("due") || text.contains("date")) {
            roles.due = Some(index);
        }
    }
    roles
}

/// Header cells: the first `thead` row, or the table's first row when there
/// is no `thead`.
pub fn header_cells<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let thead_row = parse_selector("thead tr").ok();
    let any_row = parse_selector("tr").ok();

    let header_row = thead_row
        .and_then(|sel| table.select(&sel).next())
        .or_else(|| any_row.and_then(|sel| table.select(&sel).next()));

    match header_row {
        Some(row) => row_cells(&row),
        None => Vec::new(),
    }
}

/// Data rows: `tbody` rows when present, else every row except the header.
pub fn body_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    if let Ok(sel) = parse_selector("tbody tr") {
        let rows: Vec<ElementRef> = table.select(&sel).collect();
        if !rows.is_empty() {
            return rows;
        }
    }
    match parse_selector("tr") {
        Ok(sel) => table.select(&sel).skip(1).collect(),
        Err(_) => Vec::new(),
    }
}

/// Direct td/th children of a row.
pub fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_adjacency_finds_sibling_table() {
        let doc = Html::parse_document(
            r#"<html><body>
            <h2>Assessment summary</h2>
            <p>Intro text</p>
            <table><tr><td>Essay</td><td>50%</td></tr></table>
            </body></html>"#,
        );
        let table = locate_assessment_table(&doc).unwrap();
        assert!(element_text(&table).contains("Essay"));
    }

    #[test]
    fn heading_adjacency_finds_nested_table() {
        let doc = Html::parse_document(
            r#"<html><body>
            <h3>Assessment</h3>
            <div class="section">
              <table><tr><td>Quiz</td><td>10%</td></tr></table>
            </div>
            </body></html>"#,
        );
        let table = locate_assessment_table(&doc).unwrap();
        assert!(element_text(&table).contains("Quiz"));
    }

    #[test]
    fn header_keywords_used_when_no_heading() {
        let doc = Html::parse_document(
            r#"<html><body>
            <table>
              <thead><tr><th>Staff</th><th>Office</th></tr></thead>
              <tbody><tr><td>Dr A</td><td>78-101</td></tr></tbody>
            </table>
            <table>
              <thead><tr><th>Assessment task</th><th>Weight</th><th>Due date</th></tr></thead>
              <tbody><tr><td>Report</td><td>30</td><td>Week 10</td></tr></tbody>
            </table>
            </body></html>"#,
        );
        let table = locate_assessment_table(&doc).unwrap();
        assert!(element_text(&table).contains("Report"));
    }

    #[test]
    fn content_shape_is_the_last_resort() {
        let doc = Html::parse_document(
            r#"<html><body>
            <table><tr><td>Dr A</td><td>Consultation</td></tr></table>
            <table><tr><td>Exam</td><td>60%</td></tr></table>
            </body></html>"#,
        );
        let table = locate_assessment_table(&doc).unwrap();
        assert!(element_text(&table).contains("Exam"));
    }

    #[test]
    fn no_table_at_all() {
        let doc = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(locate_assessment_table(&doc).is_none());
    }

    #[test]
    fn roles_resolve_in_priority_order() {
        let doc = Html::parse_document(
            r#"<table>
              <thead><tr><th>Assessment task</th><th>Weighting</th><th>Due date</th></tr></thead>
            </table>"#,
        );
        let sel = parse_selector("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        let roles = resolve_columns(&table);
        assert_eq!(roles.name, Some(0));
        assert_eq!(roles.weight, Some(1));
        assert_eq!(roles.due, Some(2));
    }

    #[test]
    fn one_cell_serves_at_most_one_role() {
        // "Assessment due" claims the name role first and cannot also be due
        let doc = Html::parse_document(
            r#"<table><tr><th>Assessment due</th><th>Weight</th></tr></table>"#,
        );
        let sel = parse_selector("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        let roles = resolve_columns(&table);
        assert_eq!(roles.name, Some(0));
        assert_eq!(roles.weight, Some(1));
        assert_eq!(roles.due, None);
    }

    #[test]
    fn headerless_table_yields_no_roles() {
        let doc = Html::parse_document(r#"<table><tr><td>Essay</td><td>50%</td></tr></table>"#);
        let sel = parse_selector("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        let roles = resolve_columns(&table);
        assert_eq!(roles.name, None);
        assert_eq!(roles.weight, None);
        assert_eq!(roles.due, None);
    }
}
