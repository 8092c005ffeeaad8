//! Semester and delivery-mode types.
//!
//! Offering rows describe themselves in free text ("Semester 2, 2025",
//! "In Person", "External"), so matching is substring/alias based rather
//! than an exact vocabulary.

use serde::{Deserialize, Serialize};

/// The semester slot of an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemesterType {
    Sem1,
    Sem2,
    Summer,
}

impl SemesterType {
    /// Canonical display label, also the basis of the cache-key token.
    pub fn label(&self) -> &'static str {
        match self {
            SemesterType::Sem1 => "Semester 1",
            SemesterType::Sem2 => "Semester 2",
            SemesterType::Summer => "Summer Semester",
        }
    }

    /// Whether free text from an offering row names this semester.
    ///
    /// Accepts the common aliases ("semester 1", "sem 1").
    pub fn matches_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        match self {
            SemesterType::Sem1 => lower.contains("semester 1") || lower.contains("sem 1"),
            SemesterType::Sem2 => lower.contains("semester 2") || lower.contains("sem 2"),
            SemesterType::Summer => lower.contains("summer"),
        }
    }

    /// Parse a user-supplied semester name (CLI input, key tokens).
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        let collapsed = lower.replace(['_', '-'], " ");
        if collapsed.contains("summer") {
            Some(SemesterType::Summer)
        } else if collapsed.contains('1') {
            Some(SemesterType::Sem1)
        } else if collapsed.contains('2') {
            Some(SemesterType::Sem2)
        } else {
            None
        }
    }
}

/// Mode of attendance for an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMode {
    Internal,
    External,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Internal => "Internal",
            DeliveryMode::External => "External",
        }
    }

    /// Classify free text from an offering's location/mode cell.
    ///
    /// "Flexible" and "in person" offerings count as internal attendance.
    pub fn classify(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("external") {
            Some(DeliveryMode::External)
        } else if lower.contains("internal")
            || lower.contains("in person")
            || lower.contains("flexible")
        {
            Some(DeliveryMode::Internal)
        } else {
            None
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Self::classify(text)
    }
}

/// A fully specified offering selector: which instance of a course to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemesterSelection {
    pub year: i32,
    pub semester: SemesterType,
    pub delivery: DeliveryMode,
}

impl SemesterSelection {
    pub fn new(year: i32, semester: SemesterType, delivery: DeliveryMode) -> Self {
        Self {
            year,
            semester,
            delivery,
        }
    }

    /// Human-readable description used in not-found errors.
    pub fn describe(&self) -> String {
        format!(
            "{}, {} ({})",
            self.semester.label(),
            self.year,
            self.delivery.as_str()
        )
    }
}
