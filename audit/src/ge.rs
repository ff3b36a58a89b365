//! General-education slot status inference.

use std::sync::LazyLock;

use regex::Regex;

use gradmap_types::{GeSlotRecord, GeSlots, GeStatus, SlotKey};

use crate::rows::TranscriptRowParser;
use crate::schema::{DualSlot, GeSchema, literal_markers};

/// How far into a slice an "unfulfilled" banner still counts as the slot's own status.
const STATUS_WINDOW_CHARS: usize = 200;

struct StatusPatterns {
    certified: Regex,
    unfulfilled: Regex,
    fulfilled: Regex,
    area_certified: Regex,
    waived: Regex,
}

static STATUS_PATTERNS: LazyLock<StatusPatterns> = LazyLock::new(|| StatusPatterns {
    certified: Regex::new(
        concat!(
            r"(?i)\b(?P<program>CSU\s+GE|IGETC|Cal[\s\-]?GETC)(?:[\s\-]+Breadth)?",
            r"\s+(?:full\s+)?certifi(?:ed|cation)\b|\b(?:full\s+)?GE\s+certified\b",
        ),
    )
    .expect("valid certification regex"),
    unfulfilled: Regex::new(
        concat!(
            r"(?i)\b(?:not\s+(?:yet\s+)?(?:fulfilled|satisfied|completed?|met)",
            r"|unfulfilled|unsatisfied|incomplete|needs?\s*:)",
        ),
    )
    .expect("valid unfulfilled regex"),
    fulfilled: Regex::new(r"(?i)\b(?:fulfilled|satisfied|completed?)\b")
        .expect("valid fulfilled regex"),
    area_certified: Regex::new(
        r"(?i)\barea\s+(?P<area>[A-Z0-9]{1,2}(?:\.[0-9])?)\s+cert(?:ified|ification)?\b",
    )
    .expect("valid area certification regex"),
    waived: Regex::new(r"(?i)\bwaive[ds]?\b").expect("valid waiver regex"),
});

/// True when the word just before `start` negates what follows.
fn negated_before(text: &str, start: usize) -> bool {
    text[..start]
        .split_whitespace()
        .next_back()
        .is_some_and(|word| {
            let word = word.to_ascii_lowercase();
            matches!(word.as_str(), "not" | "no" | "yet" | "without" | "un")
        })
}

/// Byte offset of the `n`th char, or the end of `text`.
fn char_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

pub struct GeneralEducationSlotMatcher<'a> {
    parser: TranscriptRowParser<'a>,
    extra_markers: Vec<Regex>,
}

impl<'a> GeneralEducationSlotMatcher<'a> {
    #[must_use]
    pub fn new(parser: TranscriptRowParser<'a>, extra_boundary_markers: &[String]) -> Self {
        Self {
            parser,
            extra_markers: literal_markers(extra_boundary_markers),
        }
    }

    /// Status for every slot of the detected schema, with the dual slots merged.
    #[must_use]
    pub fn match_slots(&self, text: &str) -> GeSlots {
        self.evaluate(text).fold()
    }

    /// Per-slot records before the dual slots are merged.
    #[must_use]
    pub fn evaluate(&self, text: &str) -> SlotEvaluation {
        let schema = GeSchema::detect(text);
        tracing::debug!(schema = schema.kind().as_str(), "detected GE schema");

        let records = schema
            .slots()
            .map(|slot| {
                let record = schema
                    .slice(text, slot.key, &self.extra_markers)
                    .map_or_else(GeSlotRecord::missing, |slice| self.infer_status(slice));
                tracing::debug!(slot = slot.key, status = ?record.status, "GE slot");
                (slot.key, record)
            })
            .collect();

        SlotEvaluation { schema, records }
    }

    /// Infer one slot's status from its text window.
    #[must_use]
    pub fn infer_status(&self, slice: &str) -> GeSlotRecord {
        let patterns = &*STATUS_PATTERNS;

        if let Some(caps) = patterns.certified.captures(slice)
            && let Some(whole) = caps.get(0)
            && !negated_before(slice, whole.start())
        {
            let note = caps.name("program").map_or_else(
                || "GE certified".to_string(),
                |program| format!("{} certified", program.as_str().to_ascii_uppercase()),
            );
            return GeSlotRecord::completed_with_note(note);
        }

        let head = &slice[..char_offset(slice, STATUS_WINDOW_CHARS)];
        let unfulfilled = patterns.unfulfilled.is_match(head)
            && !patterns
                .fulfilled
                .find_iter(head)
                .any(|m| !negated_before(head, m.start()));

        let decisive = self
            .parser
            .parse_text(slice)
            .into_iter()
            .find(|row| row.grade.is_in_progress() || row.grade.is_passing());
        if let Some(row) = decisive {
            return if row.grade.is_in_progress() {
                GeSlotRecord::in_progress(row.code)
            } else {
                GeSlotRecord::completed_by(row.code)
            };
        }
        if unfulfilled {
            return GeSlotRecord::missing();
        }

        if let Some(caps) = patterns.area_certified.captures(slice) {
            let area = caps["area"].to_ascii_uppercase();
            return GeSlotRecord::completed_with_note(format!("Area {area} certified"));
        }

        if let Some(m) = patterns.waived.find(slice)
            && !negated_before(slice, m.start())
        {
            return GeSlotRecord::completed_with_note("Waived");
        }

        GeSlotRecord::missing()
    }
}

/// Unmerged slot records of one schema, in schema order.
#[derive(Debug, Clone)]
pub struct SlotEvaluation {
    pub schema: &'static GeSchema,
    pub records: Vec<(&'static str, GeSlotRecord)>,
}

impl SlotEvaluation {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GeSlotRecord> {
        self.records
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, record)| record)
    }

    /// Mark a slot complete with a note unless a transcript row already satisfied it.
    ///
    /// Returns whether the record changed.
    pub fn certify(&mut self, key: &str, note: &str) -> bool {
        let Some((_, record)) = self.records.iter_mut().find(|(k, _)| *k == key) else {
            return false;
        };
        if record.is_satisfied_by_row() {
            return false;
        }
        *record = GeSlotRecord::completed_with_note(note);
        true
    }

    /// Collapse into [`GeSlots`], replacing the dual sides with the merged key.
    #[must_use]
    pub fn fold(self) -> GeSlots {
        let dual = self.schema.dual();
        let mut slots = GeSlots::new();
        let mut merged = false;
        for (key, record) in &self.records {
            if dual.sides.contains(key) {
                if !merged {
                    slots.insert(SlotKey::new(dual.key), merge_dual(dual, &self.records));
                    merged = true;
                }
            } else {
                slots.insert(SlotKey::new(*key), record.clone());
            }
        }
        slots
    }
}

/// Merge the two sides of a dual slot into one record.
///
/// Matching meaningful sides merge cleanly; anything else that carries
/// evidence becomes `tentative` with a note naming both sides.
#[must_use]
pub fn merge_dual(dual: DualSlot, records: &[(&str, GeSlotRecord)]) -> GeSlotRecord {
    let missing = GeSlotRecord::missing();
    let side = |key: &str| {
        records
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(&missing, |(_, record)| record)
    };
    let [key_a, key_b] = dual.sides;
    let (a, b) = (side(key_a), side(key_b));

    match (a.status.is_meaningful(), b.status.is_meaningful()) {
        (false, false) => GeSlotRecord::missing(),
        (true, true) if same_outcome(a, b) => {
            let status = if a.status == GeStatus::InProgress || b.status == GeStatus::InProgress {
                GeStatus::InProgress
            } else {
                GeStatus::Complete
            };
            GeSlotRecord {
                code: a.code.clone(),
                status,
                note: if a.code.is_some() { None } else { a.note.clone() },
            }
        }
        _ => GeSlotRecord::tentative(format!(
            "{key_a}={}; {key_b}={}",
            side_summary(a),
            side_summary(b)
        )),
    }
}

/// Both sides satisfied by the same course, or by the same code-less completion.
fn same_outcome(a: &GeSlotRecord, b: &GeSlotRecord) -> bool {
    match (&a.code, &b.code) {
        (Some(x), Some(y)) => x == y,
        (None, None) => {
            a.status == GeStatus::Complete && b.status == GeStatus::Complete && a.note == b.note
        }
        _ => false,
    }
}

fn side_summary(record: &GeSlotRecord) -> &str {
    if !record.status.is_meaningful() {
        return "Needed";
    }
    match (&record.code, &record.note) {
        (Some(code), _) => code.as_str(),
        (None, Some(note)) => note,
        (None, None) => "Needed",
    }
}
