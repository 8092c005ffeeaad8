//! Assessment data structures.
//!
//! `CourseAssessment` is the unit of extraction and caching: constructed
//! fresh per request, immutable once returned, persisted verbatim as JSON.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::SemesterSelection;

/// Serialized marker for a pass/fail weight.
pub const PASS_FAIL_MARKER: &str = "pass/fail";

/// Weight of one assessment item.
///
/// Exactly one of the two shapes holds for any parsed item: a percentage in
/// (0, 100], or the pass/fail marker. A numeric zero never survives row
/// parsing, so `Percentage(0.0)` is unrepresentable in practice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weight {
    Percentage(f64),
    PassFail,
}

impl Weight {
    pub fn is_pass_fail(&self) -> bool {
        matches!(self, Weight::PassFail)
    }

    /// Numeric weight, if any. Pass/fail items are excluded from
    /// weighted-sum math by definition.
    pub fn as_percentage(&self) -> Option<f64> {
        match self {
            Weight::Percentage(p) => Some(*p),
            Weight::PassFail => None,
        }
    }
}

// Wire shape: a JSON number, or the literal string "pass/fail". Field names
// and this encoding are consumed by downstream tools; keep them stable.
impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Weight::Percentage(p) => serializer.serialize_f64(*p),
            Weight::PassFail => serializer.serialize_str(PASS_FAIL_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct WeightVisitor;

        impl<'de> Visitor<'de> for WeightVisitor {
            type Value = Weight;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a number or the string \"{PASS_FAIL_MARKER}\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Weight, E> {
                Ok(Weight::Percentage(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Weight, E> {
                Ok(Weight::Percentage(v as f64))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Weight, E> {
                Ok(Weight::Percentage(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Weight, E> {
                if v.eq_ignore_ascii_case(PASS_FAIL_MARKER) {
                    Ok(Weight::PassFail)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(WeightVisitor)
    }
}

/// Hurdle requirement attached to an assessment item.
///
/// Invariant: if `is_hurdle` is false, `threshold` and `requirements` are
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HurdleInfo {
    pub is_hurdle: bool,

    /// Minimum mark (percent) that must be achieved on this item, if stated
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub threshold: Option<f64>,

    /// Cleaned free text describing the requirement, if found
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requirements: Option<String>,
}

impl HurdleInfo {
    /// A flagged hurdle with optional detail.
    pub fn flagged(threshold: Option<f64>, requirements: Option<String>) -> Self {
        Self {
            is_hurdle: true,
            threshold,
            requirements,
        }
    }
}

/// One gradable unit of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentItem {
    /// Display label, never empty
    pub name: String,

    /// Percentage weight or pass/fail marker
    pub weight: Weight,

    /// Free-text due date in the institution's own format. Parsing to a
    /// calendar instant is a downstream concern.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<String>,

    /// Hurdle flag and detail, when the row is hurdle-marked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hurdle: Option<HurdleInfo>,
}

impl AssessmentItem {
    pub fn is_hurdle(&self) -> bool {
        self.hurdle.as_ref().is_some_and(|h| h.is_hurdle)
    }
}

/// Extracted assessment structure for one course offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAssessment {
    /// Canonicalized (upper-case) course code
    pub course_code: String,

    /// Course title, when the profile states one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,

    /// Assessment items in document order; never empty on success
    pub items: Vec<AssessmentItem>,

    /// The offering this extraction describes, when a selector was supplied
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub semester: Option<SemesterSelection>,

    /// Provenance link to the profile document
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub course_profile_url: Option<String>,

    /// Course-wide hurdle text (≤2000 chars), when found
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub course_wide_hurdle_text: Option<String>,
}

/// Delivery modes offered for one course in one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryModeList {
    pub course_code: String,
    pub year: i32,
    pub modes: Vec<crate::models::DeliveryMode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryMode, SemesterType};

    fn sample_assessment() -> CourseAssessment {
        CourseAssessment {
            course_code: "CSSE1001".to_string(),
            title: Some("Introduction to Software Engineering".to_string()),
            items: vec![
                AssessmentItem {
                    name: "Assignment 1".to_string(),
                    weight: Weight::Percentage(20.0),
                    due_date: Some("5/04/2026".to_string()),
                    hurdle: None,
                },
                AssessmentItem {
                    name: "Participation".to_string(),
                    weight: Weight::PassFail,
                    due_date: Some("Ongoing".to_string()),
                    hurdle: None,
                },
            ],
            semester: Some(SemesterSelection::new(
                2026,
                SemesterType::Sem1,
                DeliveryMode::Internal,
            )),
            course_profile_url: Some("https://example.edu/profiles/12345".to_string()),
            course_wide_hurdle_text: None,
        }
    }

    #[test]
    fn weight_serializes_as_number_or_marker() {
        assert_eq!(
            serde_json::to_string(&Weight::Percentage(20.0)).unwrap(),
            "20.0"
        );
        assert_eq!(
            serde_json::to_string(&Weight::PassFail).unwrap(),
            "\"pass/fail\""
        );
    }

    #[test]
    fn weight_round_trips() {
        let w: Weight = serde_json::from_str("35.5").unwrap();
        assert_eq!(w, Weight::Percentage(35.5));
        let w: Weight = serde_json::from_str("\"pass/fail\"").unwrap();
        assert_eq!(w, Weight::PassFail);
        assert!(serde_json::from_str::<Weight>("\"maybe\"").is_err());
    }

    #[test]
    fn assessment_round_trips_through_json() {
        let original = sample_assessment();
        let json = serde_json::to_string(&original).unwrap();
        let restored: CourseAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn hurdle_detail_implies_flag() {
        let info = HurdleInfo::flagged(Some(80.0), Some("Must pass the exam".to_string()));
        assert!(info.is_hurdle);
    }
}
