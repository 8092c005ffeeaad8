// src/models/mod.rs

//! Domain models for the scraper application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod assessment;
mod config;
mod semester;

// Re-export all public types
pub use assessment::{
    AssessmentItem, CourseAssessment, DeliveryModeList, HurdleInfo, PASS_FAIL_MARKER, Weight,
};
pub use config::{CacheConfig, Config, QutConfig, RelayConfig, ScraperConfig, UqConfig};
pub use semester::{DeliveryMode, SemesterSelection, SemesterType};

/// Canonicalize a course code for keys and display (upper-case, trimmed).
pub fn canonical_course_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Supported institutions.
///
/// Each institution has its own scraper with unrelated heuristics; they
/// share only the output shape and the cache contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Institution {
    Uq,
    Qut,
}

impl Institution {
    /// Lower-case tag used in cache keys and CLI input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Institution::Uq => "uq",
            Institution::Qut => "qut",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "uq" => Some(Institution::Uq),
            "qut" => Some(Institution::Qut),
            _ => None,
        }
    }
}
