//! Transcript row extraction from flat text or table trees.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use gradmap_types::{GradeToken, TranscriptRow};

use crate::document::{AuditDocument, MIN_ROW_CELLS, RowView, TableView};
use crate::normalize::TextNormalizer;

/// Row classes that mark a course as currently in progress.
const IP_ROW_CLASSES: &[&str] = &["ip", "inprogress", "in-progress", "in_progress"];

struct RowPatterns {
    text_row: Regex,
    advisory: Regex,
    term_cell: Regex,
    code_cell: Regex,
    ip_status: Regex,
}

static ROW_PATTERNS: LazyLock<RowPatterns> = LazyLock::new(|| RowPatterns {
    text_row: Regex::new(
        concat!(
            r"\b(?P<term>(?:FA|SP|SU|WI)\s?\d{2})\s+",
            r"(?P<dept>[A-Z]{2,6})\s*-?\s*(?P<num>\d{3,4})(?:\s?(?P<part>[A-Z]))?\s+",
            r"(?P<units>\d{1,2}(?:\s*\.\s*\d{1,2})?)\s+",
            r"(?P<grade>CR|IP|\+\s?[A-DF]|[A-DF](?:\s?[+\-])?|P)(?:\s|$)",
        ),
    )
    .expect("valid transcript row regex"),
    advisory: Regex::new(
        concat!(
            r"(?i)\b(?:suggested|planned|hypothetical|what[\s\-]?if|advis(?:ed|ory))",
            r"(?:\s+courses?)?\s*:\s*",
            r"(?:(?:FA|SP|SU|WI)\s?\d{2}\s+)?[A-Z]{2,6}\s*-?\s*\d{3,4}[A-Z]?",
            r"(?:\s+\d{1,2}(?:\s*\.\s*\d{1,2})?)?",
            r"(?:\s+(?:(?:CR|IP|P)\b|\+\s?[A-DF]\b|[A-DF]\s?[+\-]|[A-DF]\b))?",
            r"(?:\s*[,;]\s*(?:(?:FA|SP|SU|WI)\s?\d{2}\s+)?[A-Z]{2,6}\s*-?\s*\d{3,4}[A-Z]?)*",
        ),
    )
    .expect("valid advisory regex"),
    term_cell: Regex::new(r"(?i)^(?:FA|SP|SU|WI)\s?\d{2}$").expect("valid term regex"),
    code_cell: Regex::new(r"(?i)^[A-Z]{2,6}\s*-?\s*\d{3,4}(?:\s?[A-Z])?$")
        .expect("valid code regex"),
    ip_status: Regex::new(r"(?i)^(?:IP|in[\s\-]?progress)$").expect("valid status regex"),
});

/// Rewrite a raw grade token into canonical form.
///
/// A leading `+` before a single letter moves to the end (`+C` becomes `C+`);
/// everything else is uppercased with internal whitespace removed.
#[must_use]
pub fn normalize_grade(raw: &str) -> String {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    match compact.strip_prefix('+') {
        Some(letter) if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) => {
            format!("{letter}+")
        }
        _ => compact,
    }
}

/// Remove proposed-but-not-taken course fragments before row matching.
#[must_use]
pub fn strip_advisory(text: &str) -> String {
    ROW_PATTERNS.advisory.replace_all(text, " ").into_owned()
}

#[derive(Debug, Clone, Copy)]
pub struct TranscriptRowParser<'a> {
    normalizer: &'a TextNormalizer,
}

impl<'a> TranscriptRowParser<'a> {
    #[must_use]
    pub fn new(normalizer: &'a TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Rows in document order, using the strategy that fits the document.
    ///
    /// Markup without any table falls back to scanning its visible text.
    #[must_use]
    pub fn parse_document(&self, document: &AuditDocument) -> Vec<TranscriptRow> {
        match document.query() {
            Some(query) => {
                let tables = query.tables();
                if tables.is_empty() {
                    self.parse_text(query.text())
                } else {
                    self.parse_tables(&tables)
                }
            }
            None => self.parse_text(document.text()),
        }
    }

    /// Scan normalized free text.
    #[must_use]
    pub fn parse_text(&self, text: &str) -> Vec<TranscriptRow> {
        let cleaned = strip_advisory(text);
        ROW_PATTERNS
            .text_row
            .captures_iter(&cleaned)
            .filter_map(|caps| self.text_row(&caps))
            .collect()
    }

    fn text_row(&self, caps: &Captures<'_>) -> Option<TranscriptRow> {
        let grade_raw = normalize_grade(&caps["grade"]);
        let Ok(grade) = grade_raw.parse::<GradeToken>() else {
            tracing::debug!(grade = %grade_raw, "skipping row with unknown grade");
            return None;
        };
        let part = caps.name("part").map_or("", |m| m.as_str());
        let code = self
            .normalizer
            .normalize_code(&format!("{} {}{part}", &caps["dept"], &caps["num"]));
        Some(TranscriptRow {
            term: normalize_term(&caps["term"]),
            code,
            units: parse_units(&caps["units"]),
            grade,
        })
    }

    /// Walk the own rows of each table.
    #[must_use]
    pub fn parse_tables(&self, tables: &[TableView]) -> Vec<TranscriptRow> {
        tables
            .iter()
            .flat_map(|table| table.rows.iter())
            .filter_map(|row| self.table_row(row))
            .collect()
    }

    fn table_row(&self, row: &RowView) -> Option<TranscriptRow> {
        let patterns = &*ROW_PATTERNS;
        if row.populated_cells() < MIN_ROW_CELLS {
            return None;
        }

        let [term, code, units, grade, ..] = row.cells.as_slice() else {
            return None;
        };
        if !patterns.term_cell.is_match(&term.text) || !patterns.code_cell.is_match(&code.text)
        {
            return None;
        }

        let grade = if row_marks_in_progress(row) {
            GradeToken::InProgress
        } else {
            let raw = normalize_grade(&grade.text);
            match raw.parse::<GradeToken>() {
                Ok(grade) => grade,
                Err(err) => {
                    tracing::debug!(code = %code.text, "skipping table row: {err}");
                    return None;
                }
            }
        };

        Some(TranscriptRow {
            term: normalize_term(&term.text),
            code: self.normalizer.normalize_code(&code.text),
            units: parse_units(&units.text),
            grade,
        })
    }
}

fn row_marks_in_progress(row: &RowView) -> bool {
    if IP_ROW_CLASSES.iter().any(|class| row.has_class(class)) {
        return true;
    }
    row.cells.iter().any(|cell| {
        cell.classes
            .iter()
            .any(|class| class.to_ascii_lowercase().contains("status"))
            && ROW_PATTERNS.ip_status.is_match(&cell.text)
    })
}

fn normalize_term(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn parse_units(raw: &str) -> f32 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse().unwrap_or_else(|_| {
        tracing::debug!(units = %raw, "unparsable units, recording 0");
        0.0
    })
}
