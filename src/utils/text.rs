// src/utils/text.rs

//! Text token rules shared by the institution scrapers.
//!
//! Course profiles state weights, dates and hurdle thresholds in free text;
//! these helpers centralize the patterns both scrapers mine for.

use std::sync::OnceLock;

use regex::Regex;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)").unwrap())
}

fn pass_fail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)pass\s*/?\s*fail").unwrap())
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,3}(?:\.\d+)?\s*%").unwrap())
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            \d{1,2}\s*/\s*\d{1,2}(?:\s*/\s*\d{2,4})?      # 5/04 or 5/04/2026
            | \b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b
            | \bweek\s*\d+
            | examination\s+period
            | \bongoing\b",
        )
        .unwrap()
    })
}

fn threshold_primary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:pass\s+)?threshold\s+(?:is\s+)?(\d{1,3}(?:\.\d+)?)\s*%").unwrap()
    })
}

fn threshold_secondary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s+threshold").unwrap())
}

/// Collapse all runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First embedded numeric token, if any.
pub fn first_number(s: &str) -> Option<f64> {
    number_re()
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether the text marks an item as pass/fail ("Pass/Fail", "pass fail").
pub fn is_pass_fail(s: &str) -> bool {
    pass_fail_re().is_match(s)
}

/// Whether the text contains a numeric percentage.
pub fn contains_percentage(s: &str) -> bool {
    percent_re().is_match(s)
}

/// Whether the text is date-shaped (day/month digits, a month name, a
/// teaching-week reference, or scheduling phrases like "Ongoing").
pub fn looks_like_date(s: &str) -> bool {
    date_re().is_match(s)
}

/// Extract a hurdle pass threshold from free text.
///
/// "(pass) threshold (is) NN%" takes priority over "NN% threshold".
/// The value is clamped to [0, 100].
pub fn hurdle_threshold(s: &str) -> Option<f64> {
    let captures = threshold_primary_re()
        .captures(s)
        .or_else(|| threshold_secondary_re().captures(s))?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

/// First 4-digit year embedded in the text.
pub fn embedded_year(s: &str) -> Option<i32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\b(\d{4})\b").unwrap());
    re.captures(s)?.get(1)?.as_str().parse().ok()
}
