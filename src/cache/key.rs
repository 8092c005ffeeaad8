// src/cache/key.rs

//! Cache-key derivation and parsing.
//!
//! Key formats are an external contract; other tools enumerate and parse
//! them:
//!
//! ```text
//! scrape:{institution}:{COURSE}
//! scrape:{institution}:{COURSE}:{year}:{semester_with_underscores}:{delivery}
//! delivery:{institution}:{COURSE}:{year}:{semester_with_underscores}
//! ```
//!
//! Derivation is pure and deterministic; `derive(parse(k)) == k` for every
//! well-formed key.

use crate::models::{
    DeliveryMode, Institution, SemesterSelection, SemesterType, canonical_course_code,
};

/// Key-namespace prefix for cached extractions.
pub const SCRAPE_PREFIX: &str = "scrape";

/// Key-namespace prefix for cached delivery-mode lookups.
pub const DELIVERY_PREFIX: &str = "delivery";

/// A typed cache key for one cached artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A cached `CourseAssessment` extraction.
    Scrape {
        institution: Institution,
        course: String,
        selection: Option<SemesterSelection>,
    },
    /// A cached `DeliveryModeList` lookup.
    Delivery {
        institution: Institution,
        course: String,
        year: i32,
        semester: SemesterType,
    },
}

impl CacheKey {
    pub fn scrape(
        institution: Institution,
        course: &str,
        selection: Option<SemesterSelection>,
    ) -> Self {
        CacheKey::Scrape {
            institution,
            course: canonical_course_code(course),
            selection,
        }
    }

    pub fn delivery(
        institution: Institution,
        course: &str,
        year: i32,
        semester: SemesterType,
    ) -> Self {
        CacheKey::Delivery {
            institution,
            course: canonical_course_code(course),
            year,
            semester,
        }
    }

    /// Encode to the wire key string.
    pub fn derive(&self) -> String {
        match self {
            CacheKey::Scrape {
                institution,
                course,
                selection,
            } => match selection {
                Some(sel) => format!(
                    "{SCRAPE_PREFIX}:{}:{}:{}:{}:{}",
                    institution.as_str(),
                    course,
                    sel.year,
                    semester_token(sel.semester),
                    sel.delivery.as_str()
                ),
                None => format!("{SCRAPE_PREFIX}:{}:{}", institution.as_str(), course),
            },
            CacheKey::Delivery {
                institution,
                course,
                year,
                semester,
            } => format!(
                "{DELIVERY_PREFIX}:{}:{}:{}:{}",
                institution.as_str(),
                course,
                year,
                semester_token(*semester)
            ),
        }
    }

    /// Parse a wire key string back into a typed key.
    pub fn parse(key: &str) -> Option<Self> {
        let parts: Vec<&str> = key.split(':').collect();
        match parts.as_slice() {
            [SCRAPE_PREFIX, institution, course] => Some(CacheKey::Scrape {
                institution: Institution::parse(institution)?,
                course: (*course).to_string(),
                selection: None,
            }),
            [SCRAPE_PREFIX, institution, course, year, semester, delivery] => {
                Some(CacheKey::Scrape {
                    institution: Institution::parse(institution)?,
                    course: (*course).to_string(),
                    selection: Some(SemesterSelection {
                        year: year.parse().ok()?,
                        semester: parse_semester_token(semester)?,
                        delivery: DeliveryMode::parse(delivery)?,
                    }),
                })
            }
            [DELIVERY_PREFIX, institution, course, year, semester] => Some(CacheKey::Delivery {
                institution: Institution::parse(institution)?,
                course: (*course).to_string(),
                year: year.parse().ok()?,
                semester: parse_semester_token(semester)?,
            }),
            _ => None,
        }
    }
}

/// Semester token for keys: the display label with whitespace replaced by
/// underscores.
pub fn semester_token(semester: SemesterType) -> String {
    semester.label().replace(char::is_whitespace, "_")
}

fn parse_semester_token(token: &str) -> Option<SemesterType> {
    SemesterType::parse(&token.replace('_', " "))
}

/// Year embedded in a raw key string, if one of its `:`-separated segments
/// is exactly four digits. Keys without one are never age-evicted.
pub fn embedded_key_year(key: &str) -> Option<i32> {
    key.split(':')
        .find(|segment| segment.len() == 4 && segment.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|segment| segment.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_key_with_selection() {
        let key = CacheKey::scrape(
            Institution::Uq,
            "csse1001",
            Some(SemesterSelection::new(
                2025,
                SemesterType::Sem2,
                DeliveryMode::External,
            )),
        );
        assert_eq!(key.derive(), "scrape:uq:CSSE1001:2025:Semester_2:External");
    }

    #[test]
    fn scrape_key_without_selection() {
        let key = CacheKey::scrape(Institution::Qut, "cab202", None);
        assert_eq!(key.derive(), "scrape:qut:CAB202");
    }

    #[test]
    fn delivery_key_format() {
        let key = CacheKey::delivery(Institution::Uq, "MATH1051", 2026, SemesterType::Summer);
        assert_eq!(key.derive(), "delivery:uq:MATH1051:2026:Summer_Semester");
    }

    #[test]
    fn derive_parse_round_trip() {
        let keys = [
            "scrape:uq:CSSE1001:2025:Semester_2:External",
            "scrape:uq:CSSE1001:2026:Summer_Semester:Internal",
            "scrape:qut:CAB202",
            "delivery:uq:MATH1051:2026:Semester_1",
        ];
        for key in keys {
            let parsed = CacheKey::parse(key).unwrap();
            assert_eq!(parsed.derive(), key, "round trip failed for {key}");
        }
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(CacheKey::parse("scrape:uq"), None);
        assert_eq!(CacheKey::parse("scrape:unknown:CSSE1001"), None);
        assert_eq!(CacheKey::parse("other:uq:CSSE1001"), None);
        assert_eq!(
            CacheKey::parse("scrape:uq:CSSE1001:banana:Semester_1:Internal"),
            None
        );
    }

    #[test]
    fn embedded_year_ignores_course_digits() {
        assert_eq!(
            embedded_key_year("scrape:uq:CSSE1001:2025:Semester_2:External"),
            Some(2025)
        );
        // The course code's digit run is not a standalone segment
        assert_eq!(embedded_key_year("scrape:uq:CSSE1001"), None);
        assert_eq!(
            embedded_key_year("delivery:uq:MATH1051:2024:Semester_1"),
            Some(2024)
        );
    }
}
