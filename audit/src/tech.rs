//! Technical-elective mentions inside the electives section.

use std::sync::LazyLock;

use regex::Regex;

use gradmap_types::{GradeToken, TechEvidence};

use crate::normalize::TextNormalizer;
use crate::rows::normalize_grade;
use crate::schema::literal_markers;

struct TechPatterns {
    code: Regex,
    ip: Regex,
    units: Regex,
}

static TECH_PATTERNS: LazyLock<TechPatterns> = LazyLock::new(|| TechPatterns {
    code: Regex::new(r"\b(?P<dept>[A-Z]{2,6})\s*-?\s*(?P<num>\d{3,4}[A-Z]?)\b")
        .expect("valid elective code regex"),
    ip: Regex::new(r"\bIP\b").expect("valid IP regex"),
    units: Regex::new(r"\b\d+\s*\.\s*\d").expect("valid units regex"),
});

pub struct TechnicalElectiveMatcher<'a> {
    normalizer: &'a TextNormalizer,
    start: Option<Regex>,
    ends: Vec<Regex>,
}

impl<'a> TechnicalElectiveMatcher<'a> {
    #[must_use]
    pub fn new(normalizer: &'a TextNormalizer, start_marker: &str, end_markers: &[String]) -> Self {
        Self {
            normalizer,
            start: literal_markers(&[start_marker.to_string()]).into_iter().next(),
            ends: literal_markers(end_markers),
        }
    }

    /// The electives section: from the start marker to the first end marker after it.
    #[must_use]
    pub fn section<'t>(&self, text: &'t str) -> Option<&'t str> {
        let start = self.start.as_ref()?.find(text)?;
        let end = self
            .ends
            .iter()
            .filter_map(|pattern| pattern.find_at(text, start.end()))
            .map(|m| m.start())
            .min()
            .unwrap_or(text.len());
        Some(&text[start.end()..end])
    }

    #[must_use]
    pub fn match_electives(&self, text: &str) -> TechEvidence {
        self.section(text)
            .map(|section| self.classify(section))
            .unwrap_or_default()
    }

    /// Classify each code by the text between it and the next code.
    #[must_use]
    pub fn classify(&self, section: &str) -> TechEvidence {
        let patterns = &*TECH_PATTERNS;
        let mentions: Vec<_> = patterns.code.captures_iter(section).collect();
        let mut evidence = TechEvidence::default();

        for (i, caps) in mentions.iter().enumerate() {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let window_end = mentions
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(section.len(), |m| m.start());
            let window = &section[whole.end()..window_end];
            let code = self
                .normalizer
                .normalize_code(&format!("{} {}", &caps["dept"], &caps["num"]));

            if window.trim_start().starts_with('=') {
                tracing::debug!(code = %code, "skipping articulation reference");
                continue;
            }
            if patterns.ip.is_match(window) {
                evidence.push_ip(code);
            } else if patterns.units.is_match(window) && has_passing_grade(window) {
                evidence.push_completed(code);
            }
        }

        evidence
    }
}

/// An uppercase whitespace-delimited token that is a passing grade.
fn has_passing_grade(window: &str) -> bool {
    window
        .split_whitespace()
        .filter(|token| *token == token.to_ascii_uppercase())
        .filter_map(|token| normalize_grade(token).parse::<GradeToken>().ok())
        .any(GradeToken::is_passing)
}

#[cfg(test)]
mod tests {
    use super::TechnicalElectiveMatcher;
    use crate::normalize::TextNormalizer;
    use gradmap_types::CourseCode;

    fn codes(list: &[CourseCode]) -> Vec<&str> {
        list.iter().map(CourseCode::as_str).collect()
    }

    fn matcher(normalizer: &TextNormalizer) -> TechnicalElectiveMatcher<'_> {
        TechnicalElectiveMatcher::new(
            normalizer,
            "Technical Electives",
            &["General Education".to_string(), "Unit Requirements".to_string()],
        )
    }

    #[test]
    fn section_is_bounded_by_first_end_marker() {
        let normalizer = TextNormalizer::default();
        let m = matcher(&normalizer);
        let text =
            "Major CPSC 120 Technical Electives CPSC 440 3.0 A Unit Requirements CPSC 499 3.0 A";
        assert_eq!(m.section(text), Some(" CPSC 440 3.0 A "));
        assert!(m.section("no electives here").is_none());
    }

    #[test]
    fn classifies_windows() {
        let normalizer = TextNormalizer::default();
        let m = matcher(&normalizer);
        let evidence = m.match_electives(
            "TECHNICAL ELECTIVES CPSC 440 3.0 A CPSC-431 IP CPSC 474 3.0 D \
             CPSC 481 = ENGR 481 3.0 A CPSC 483 needed General Education",
        );
        assert_eq!(codes(&evidence.completed), ["CPSC 440", "ENGR 481"]);
        assert_eq!(codes(&evidence.ip), ["CPSC 431"]);
    }

    #[test]
    fn lowercase_words_are_not_grades() {
        let normalizer = TextNormalizer::default();
        let m = matcher(&normalizer);
        let evidence = m.classify("CPSC 440 take a 3.0 unit course");
        assert!(evidence.completed.is_empty());
    }

    #[test]
    fn duplicates_are_folded() {
        let normalizer = TextNormalizer::default();
        let m = matcher(&normalizer);
        let evidence = m.classify("CPSC 440 3.0 A CPSC 440 3.0 B+");
        assert_eq!(codes(&evidence.completed), ["CPSC 440"]);
    }
}
