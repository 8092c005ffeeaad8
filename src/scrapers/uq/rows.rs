// src/scrapers/uq/rows.rs

//! Row parser: one table row to one typed assessment item.
//!
//! Rows that cannot produce a plausible item are silently dropped rather
//! than failing the extraction; only a table yielding zero items is a hard
//! failure (handled by the caller).

use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use crate::models::{AssessmentItem, HurdleInfo, Weight};
use crate::scrapers::uq::table::{ColumnRoles, row_cells};
use crate::utils::text::{
    contains_percentage, first_number, hurdle_threshold, is_pass_fail, looks_like_date,
};
use crate::utils::{element_text, parse_selector};

fn hurdle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)hurdle").unwrap())
}

/// Parse one row into an item, or None to skip it.
///
/// Skips are silent: header/decoration rows (≤1 cell), rows with no
/// extractable name, and rows whose weight resolves outside (0, 100].
/// An out-of-range weight always signals parse failure, not a real item;
/// the source markup does not distinguish the two.
pub fn parse_row(row: &ElementRef, roles: &ColumnRoles) -> Option<AssessmentItem> {
    let cells = row_cells(row);
    if cells.len() <= 1 {
        return None;
    }

    let texts: Vec<String> = cells.iter().map(element_text).collect();

    let name = extract_name(&cells, &texts, roles)?;
    let weight = extract_weight(&cells, &texts, roles)?;
    if weight
        .as_percentage()
        .is_some_and(|p| p <= 0.0 || p > 100.0)
    {
        return None;
    }

    let due_date = extract_due(&texts, roles);
    let hurdle = detect_hurdle(row, &texts);

    Some(AssessmentItem {
        name,
        weight,
        due_date,
        hurdle,
    })
}

/// Name from the resolved column, else the first cell. Inner link text is
/// preferred since task names are often hyperlinks into the detail section.
fn extract_name(
    cells: &[ElementRef],
    texts: &[String],
    roles: &ColumnRoles,
) -> Option<String> {
    let index = roles.name.filter(|i| *i < cells.len()).unwrap_or(0);
    let cell = &cells[index];

    let link_sel = parse_selector("a").ok()?;
    let name = cell
        .select(&link_sel)
        .map(|a| element_text(&a))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| texts[index].clone());

    (!name.is_empty()).then_some(name)
}

fn weight_from_text(text: &str) -> Option<Weight> {
    if is_pass_fail(text) {
        return Some(Weight::PassFail);
    }
    first_number(text).map(Weight::Percentage)
}

/// Weight from the resolved column, else by row-level heuristic: a
/// pass/fail marker anywhere wins immediately; otherwise the first cell
/// carrying a percentage or a bare number supplies the value.
fn extract_weight(
    cells: &[ElementRef],
    texts: &[String],
    roles: &ColumnRoles,
) -> Option<Weight> {
    if let Some(index) = roles.weight.filter(|i| *i < cells.len()) {
        return weight_from_text(&texts[index]);
    }

    if texts.iter().any(|text| is_pass_fail(text)) {
        return Some(Weight::PassFail);
    }

    texts
        .iter()
        .find(|text| contains_percentage(text) || text.trim().parse::<f64>().is_ok())
        .and_then(|text| first_number(text))
        .map(Weight::Percentage)
}

/// Due date from the resolved column, else the first date-shaped cell.
fn extract_due(texts: &[String], roles: &ColumnRoles) -> Option<String> {
    if let Some(index) = roles.due.filter(|i| *i < texts.len()) {
        let text = texts[index].clone();
        return (!text.is_empty()).then_some(text);
    }
    texts
        .iter()
        .find(|text| looks_like_date(text))
        .cloned()
}

/// Hurdle flag from cell text, or from an icon/image whose alt/title/class
/// mentions a hurdle. Threshold mining only runs on flagged rows.
fn detect_hurdle(row: &ElementRef, texts: &[String]) -> Option<HurdleInfo> {
    let text_flag = texts.iter().any(|text| hurdle_re().is_match(text));
    let icon_flag = !text_flag && icon_marks_hurdle(row);
    if !text_flag && !icon_flag {
        return None;
    }

    let threshold = texts.iter().find_map(|text| hurdle_threshold(text));
    Some(HurdleInfo::flagged(threshold, None))
}

fn icon_marks_hurdle(row: &ElementRef) -> bool {
    for node in row.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let marked = ["alt", "title", "class"].iter().any(|attr| {
            element
                .value()
                .attr(attr)
                .is_some_and(|value| hurdle_re().is_match(value))
        });
        if marked {
            return true;
        }
    }
    false
}
