// src/scrapers/uq/hurdles.rs

//! Hurdle-text miner.
//!
//! Hurdle detail lives in free-text sections near the assessment table,
//! co-located with administrative boilerplate (submission mechanics,
//! extension policy). A pure proximity search over-collects, so both
//! passes filter with positive/negative keyword patterns and bound the
//! output length. Absence of text is never an error.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::utils::text::{normalize_whitespace, truncate_chars};
use crate::utils::{element_text, heading_level, next_sibling_elements, parse_selector};

/// Per-item requirement text cap.
const ITEM_TEXT_CAP: usize = 1000;

/// Course-wide hurdle text cap.
const COURSE_TEXT_CAP: usize = 2000;

/// Boilerplate phrases that end a per-item requirement block. Text is
/// truncated at the first occurrence of any of these.
const STOP_PHRASES: [&str; 5] = [
    "submission guidelines",
    "late submission",
    "deferral or extension",
    "you may be able to defer",
    "a penalty of",
];

fn positive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            threshold
            | must \s+ (?:pass|achieve|obtain)
            | minimum \s+ (?:of|mark|grade)
            | at \s+ least \s+ \d{1,3} \s* %
            | \d{1,3} \s* % \s+ (?:or \s+ (?:higher|above)|to \s+ pass)
            | capped \s+ at
            | pass \s+ (?:the|each|all)",
        )
        .unwrap()
    })
}

fn exclusion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            submission \s+ guidelines
            | late \s+ (?:submission|penalt)
            | extension \s+ (?:request|polic)
            | deferral
            | academic \s+ integrity
            | plagiarism
            | turnitin",
        )
        .unwrap()
    })
}

fn item_anchor_selector(index: usize) -> Option<scraper::Selector> {
    parse_selector(&format!("#assessment-detail-{index}")).ok()
}

/// Per-item hurdle requirement text for the item at `index`.
///
/// The detail subsection is found by id convention first, then by fuzzy
/// heading match against the item name. Within it, a sub-heading literally
/// reading "Hurdle requirements" opens the block; sibling text is collected
/// until the next same-or-higher heading and truncated at the first
/// stop-phrase.
pub fn item_requirements(document: &Html, index: usize, item_name: &str) -> Option<String> {
    let section = find_item_section(document, index, item_name)?;
    let text = hurdle_block_in_section(&section)?;
    let cleaned = strip_stop_phrases(&text);
    (!cleaned.is_empty()).then(|| truncate_chars(&cleaned, ITEM_TEXT_CAP))
}

fn find_item_section<'a>(
    document: &'a Html,
    index: usize,
    item_name: &str,
) -> Option<ElementRef<'a>> {
    if let Some(sel) = item_anchor_selector(index) {
        if let Some(section) = document.select(&sel).next() {
            return Some(section);
        }
    }
    find_section_by_heading(document, item_name)
}

/// Fuzzy heading match: at least two overlapping significant words between
/// the heading text and the item name.
fn find_section_by_heading<'a>(document: &'a Html, item_name: &str) -> Option<ElementRef<'a>> {
    let heading_sel = parse_selector("h1, h2, h3, h4, h5, h6").ok()?;
    let name_words = significant_words(item_name);
    if name_words.is_empty() {
        return None;
    }

    for heading in document.select(&heading_sel) {
        let heading_words = significant_words(&element_text(&heading));
        let overlap = heading_words
            .iter()
            .filter(|word| name_words.contains(word))
            .count();
        if overlap >= 2 || (name_words.len() == 1 && overlap == 1) {
            // The heading's parent container is the detail subsection
            return heading.parent().and_then(ElementRef::wrap);
        }
    }
    None
}

fn significant_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 3)
        .map(str::to_string)
        .collect()
}

/// Find the "Hurdle requirements" sub-heading inside a section and collect
/// sibling text until the next same-or-higher-level heading.
fn hurdle_block_in_section(section: &ElementRef) -> Option<String> {
    let heading_sel = parse_selector("h1, h2, h3, h4, h5, h6").ok()?;

    let opener = section.select(&heading_sel).find(|heading| {
        element_text(heading)
            .to_lowercase()
            .trim()
            .starts_with("hurdle requirement")
    })?;
    let opener_level = heading_level(&opener).unwrap_or(6);

    let mut parts = Vec::new();
    for sibling in next_sibling_elements(&opener) {
        if heading_level(&sibling).is_some_and(|level| level <= opener_level) {
            break;
        }
        let text = element_text(&sibling);
        if !text.is_empty() {
            parts.push(text);
        }
    }

    let joined = normalize_whitespace(&parts.join(" "));
    (!joined.is_empty()).then_some(joined)
}

/// Truncate at the first occurrence of any stop phrase.
fn strip_stop_phrases(text: &str) -> String {
    let lower = text.to_lowercase();
    let cut = STOP_PHRASES
        .iter()
        .filter_map(|phrase| lower.find(phrase))
        .min();
    match cut {
        Some(at) => text[..at].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Course-wide hurdle information.
///
/// Scans headings for the exact phrase "hurdle requirement(s)", collects
/// following sibling blocks until the next same-or-higher heading, and
/// keeps a block only if it matches a positive hurdle-content pattern and
/// no administrative exclusion pattern.
pub fn course_wide_hurdle_text(document: &Html) -> Option<String> {
    let heading_sel = parse_selector("h1, h2, h3, h4, h5, h6").ok()?;

    let mut kept = Vec::new();
    for heading in document.select(&heading_sel) {
        let title = element_text(&heading).to_lowercase();
        let title = title.trim();
        if title != "hurdle requirement" && title != "hurdle requirements" {
            continue;
        }
        let level = heading_level(&heading).unwrap_or(6);

        for sibling in next_sibling_elements(&heading) {
            if heading_level(&sibling).is_some_and(|l| l <= level) {
                break;
            }
            let text = normalize_whitespace(&element_text(&sibling));
            if text.is_empty() {
                continue;
            }
            if positive_re().is_match(&text) && !exclusion_re().is_match(&text) {
                kept.push(text);
            }
        }
    }

    if kept.is_empty() {
        return None;
    }
    Some(truncate_chars(&kept.join(" "), COURSE_TEXT_CAP))
}
