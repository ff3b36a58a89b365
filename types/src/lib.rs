//! Core domain types for gradmap.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer: the audit extractor produces
//! [`Evidence`], the reconciliation engine consumes it together with
//! [`CurriculumNode`]s and hands back a [`ReconciliationResult`].

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod curriculum;
mod evidence;
mod sanitize;

pub use curriculum::{
    CurriculumNode, NodeCategory, NodeEntry, NodeId, ReconciliationResult, ScheduleLabel,
};
pub use evidence::{
    Evidence, EvidenceSummary, GeSlotRecord, GeSlots, GeStatus, SlotKey, TechEvidence,
};
pub use sanitize::sanitize_note_text;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Course Codes
// ============================================================================

/// A course identifier in canonical `"DEPT NUM[PART]"` form.
///
/// The type does not normalize on its own; raw tokens go through
/// `gradmap_audit::TextNormalizer::normalize_code`, which is the only place
/// that knows the separator and alias rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    /// Wrap an already-canonical code.
    #[must_use]
    pub fn from_canonical(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CourseCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A combined course and the two lecture/lab parts that together equal it.
///
/// Invariant: `combined` and both `parts` share department and number; the
/// parts differ only by their suffix letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalencyGroup {
    pub combined: CourseCode,
    pub parts: [CourseCode; 2],
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("equivalency group {combined} is inconsistent: {reason}")]
pub struct EquivalencyGroupError {
    pub combined: String,
    pub reason: &'static str,
}

impl EquivalencyGroup {
    /// Build a group, checking that the parts are suffixed variants of `combined`.
    pub fn new(
        combined: CourseCode,
        parts: [CourseCode; 2],
    ) -> Result<Self, EquivalencyGroupError> {
        let base = combined.as_str();
        let err = |reason| EquivalencyGroupError {
            combined: base.to_string(),
            reason,
        };

        if parts[0] == parts[1] {
            return Err(err("parts must differ"));
        }
        for part in &parts {
            let Some(suffix) = part.as_str().strip_prefix(base) else {
                return Err(err("parts must extend the combined code"));
            };
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(err("parts may differ only by a letter suffix"));
            }
        }
        Ok(Self { combined, parts })
    }

    #[must_use]
    pub fn contains_part(&self, code: &CourseCode) -> bool {
        self.parts.iter().any(|p| p == code)
    }
}

// ============================================================================
// Grades & Transcript Rows
// ============================================================================

/// A normalized grade or status token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeToken {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "CR")]
    Credit,
    #[serde(rename = "P")]
    Pass,
    #[serde(rename = "IP")]
    InProgress,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized grade token: {0:?}")]
pub struct GradeParseError(pub String);

impl GradeToken {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GradeToken::A => "A",
            GradeToken::AMinus => "A-",
            GradeToken::BPlus => "B+",
            GradeToken::B => "B",
            GradeToken::BMinus => "B-",
            GradeToken::CPlus => "C+",
            GradeToken::C => "C",
            GradeToken::CMinus => "C-",
            GradeToken::DPlus => "D+",
            GradeToken::D => "D",
            GradeToken::DMinus => "D-",
            GradeToken::F => "F",
            GradeToken::Credit => "CR",
            GradeToken::Pass => "P",
            GradeToken::InProgress => "IP",
        }
    }

    /// `CR`, `P`, or a letter grade of `C-` or better.
    #[must_use]
    pub const fn is_passing(self) -> bool {
        matches!(
            self,
            GradeToken::A
                | GradeToken::AMinus
                | GradeToken::BPlus
                | GradeToken::B
                | GradeToken::BMinus
                | GradeToken::CPlus
                | GradeToken::C
                | GradeToken::CMinus
                | GradeToken::Credit
                | GradeToken::Pass
        )
    }

    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, GradeToken::InProgress)
    }
}

impl FromStr for GradeToken {
    type Err = GradeParseError;

    /// Parses an already-normalized token (uppercase, no internal whitespace).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "A" | "A+" => GradeToken::A,
            "A-" => GradeToken::AMinus,
            "B+" => GradeToken::BPlus,
            "B" => GradeToken::B,
            "B-" => GradeToken::BMinus,
            "C+" => GradeToken::CPlus,
            "C" => GradeToken::C,
            "C-" => GradeToken::CMinus,
            "D+" => GradeToken::DPlus,
            "D" => GradeToken::D,
            "D-" => GradeToken::DMinus,
            "F" => GradeToken::F,
            "CR" => GradeToken::Credit,
            "P" => GradeToken::Pass,
            "IP" => GradeToken::InProgress,
            other => return Err(GradeParseError(other.to_string())),
        })
    }
}

impl fmt::Display for GradeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (term, course, units, grade) record in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub term: String,
    pub code: CourseCode,
    pub units: f32,
    pub grade: GradeToken,
}

#[cfg(test)]
mod tests {
    use super::{CourseCode, EquivalencyGroup, GradeToken};

    fn code(s: &str) -> CourseCode {
        CourseCode::from_canonical(s)
    }

    #[test]
    fn passing_grades() {
        for token in ["A", "A-", "B+", "B", "B-", "C+", "C", "C-", "CR", "P"] {
            let grade: GradeToken = token.parse().unwrap();
            assert!(grade.is_passing(), "{token} should pass");
        }
        for token in ["D+", "D", "D-", "F", "IP"] {
            let grade: GradeToken = token.parse().unwrap();
            assert!(!grade.is_passing(), "{token} should not pass");
        }
    }

    #[test]
    fn in_progress_is_only_ip() {
        assert!(GradeToken::InProgress.is_in_progress());
        assert!(!GradeToken::Credit.is_in_progress());
    }

    #[test]
    fn grade_rejects_unknown_tokens() {
        assert!("W".parse::<GradeToken>().is_err());
        assert!("b".parse::<GradeToken>().is_err());
    }

    #[test]
    fn grade_serializes_as_token() {
        let json = serde_json::to_string(&GradeToken::CMinus).unwrap();
        assert_eq!(json, "\"C-\"");
    }

    #[test]
    fn equivalency_group_accepts_suffixed_parts() {
        let group =
            EquivalencyGroup::new(code("CPSC 120"), [code("CPSC 120A"), code("CPSC 120L")])
                .unwrap();
        assert!(group.contains_part(&code("CPSC 120L")));
        assert!(!group.contains_part(&code("CPSC 120")));
    }

    #[test]
    fn equivalency_group_rejects_foreign_parts() {
        assert!(
            EquivalencyGroup::new(code("CPSC 120"), [code("CPSC 121A"), code("CPSC 120L")])
                .is_err()
        );
        assert!(
            EquivalencyGroup::new(code("CPSC 120"), [code("CPSC 120A"), code("CPSC 120A")])
                .is_err()
        );
        assert!(
            EquivalencyGroup::new(code("CPSC 120"), [code("CPSC 1201"), code("CPSC 120L")])
                .is_err()
        );
    }
}
