//! Facts extracted from one audit document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CourseCode;

/// Key of a general-education slot or special requirement (`"A.1"`, `"C.3/Z"`, `"AI"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeStatus {
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "IP")]
    InProgress,
    #[serde(rename = "tentative")]
    Tentative,
    #[serde(rename = "missing")]
    Missing,
}

impl GeStatus {
    /// `complete` and `IP` carry evidence; `tentative` and `missing` do not.
    #[must_use]
    pub const fn is_meaningful(self) -> bool {
        matches!(self, GeStatus::Complete | GeStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeSlotRecord {
    pub code: Option<CourseCode>,
    pub status: GeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GeSlotRecord {
    #[must_use]
    pub fn missing() -> Self {
        Self {
            code: None,
            status: GeStatus::Missing,
            note: None,
        }
    }

    #[must_use]
    pub fn completed_by(code: CourseCode) -> Self {
        Self {
            code: Some(code),
            status: GeStatus::Complete,
            note: None,
        }
    }

    #[must_use]
    pub fn in_progress(code: CourseCode) -> Self {
        Self {
            code: Some(code),
            status: GeStatus::InProgress,
            note: None,
        }
    }

    /// Complete without a course code (certification, waiver).
    #[must_use]
    pub fn completed_with_note(note: impl Into<String>) -> Self {
        Self {
            code: None,
            status: GeStatus::Complete,
            note: Some(note.into()),
        }
    }

    #[must_use]
    pub fn tentative(note: impl Into<String>) -> Self {
        Self {
            code: None,
            status: GeStatus::Tentative,
            note: Some(note.into()),
        }
    }

    /// Satisfied by an actual transcript row rather than a note-only signal.
    #[must_use]
    pub fn is_satisfied_by_row(&self) -> bool {
        self.status == GeStatus::Complete && self.code.is_some()
    }
}

/// Slot records in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeSlots(Vec<(SlotKey, GeSlotRecord)>);

impl GeSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: SlotKey, record: GeSlotRecord) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = record;
        } else {
            self.0.push((key, record));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<GeSlotRecord> {
        let index = self.0.iter().position(|(k, _)| k.as_str() == key)?;
        Some(self.0.remove(index).1)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GeSlotRecord> {
        self.0
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &GeSlotRecord)> {
        self.0.iter().map(|(k, r)| (k, r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &SlotKey> {
        self.0.iter().map(|(k, _)| k)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Technical-elective mentions, in document order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechEvidence {
    pub completed: Vec<CourseCode>,
    pub ip: Vec<CourseCode>,
}

impl TechEvidence {
    pub fn push_completed(&mut self, code: CourseCode) {
        if !self.completed.contains(&code) {
            self.completed.push(code);
        }
    }

    pub fn push_ip(&mut self, code: CourseCode) {
        if !self.ip.contains(&code) {
            self.ip.push(code);
        }
    }
}

/// Everything one extraction run learned from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub passed: BTreeSet<CourseCode>,
    pub ip: BTreeSet<CourseCode>,
    pub substitutions: BTreeMap<CourseCode, String>,
    pub ge_slots: GeSlots,
    pub tech: TechEvidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceSummary {
    pub passed: usize,
    pub ip: usize,
    pub substitutions: usize,
    pub ge_slots: usize,
    pub ge_complete: usize,
    pub tech_completed: usize,
    pub tech_ip: usize,
}

impl Evidence {
    #[must_use]
    pub fn summary(&self) -> EvidenceSummary {
        EvidenceSummary {
            passed: self.passed.len(),
            ip: self.ip.len(),
            substitutions: self.substitutions.len(),
            ge_slots: self.ge_slots.len(),
            ge_complete: self
                .ge_slots
                .iter()
                .filter(|(_, r)| r.status == GeStatus::Complete)
                .count(),
            tech_completed: self.tech.completed.len(),
            tech_ip: self.tech.ip.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CourseCode, GeSlotRecord, GeSlots, GeStatus, SlotKey, TechEvidence};

    #[test]
    fn slots_keep_first_insertion_position() {
        let mut slots = GeSlots::new();
        slots.insert(SlotKey::new("A.1"), GeSlotRecord::missing());
        slots.insert(SlotKey::new("A.2"), GeSlotRecord::missing());
        slots.insert(
            SlotKey::new("A.1"),
            GeSlotRecord::completed_by(CourseCode::from_canonical("COMM 102")),
        );

        let keys: Vec<&str> = slots.keys().map(SlotKey::as_str).collect();
        assert_eq!(keys, ["A.1", "A.2"]);
        assert_eq!(slots.get("A.1").map(|r| r.status), Some(GeStatus::Complete));
    }

    #[test]
    fn tech_evidence_dedups_in_order() {
        let mut tech = TechEvidence::default();
        tech.push_completed(CourseCode::from_canonical("CPSC 440"));
        tech.push_completed(CourseCode::from_canonical("CPSC 431"));
        tech.push_completed(CourseCode::from_canonical("CPSC 440"));
        let codes: Vec<&str> = tech.completed.iter().map(CourseCode::as_str).collect();
        assert_eq!(codes, ["CPSC 440", "CPSC 431"]);
    }

    #[test]
    fn status_serializes_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&GeStatus::InProgress).unwrap(),
            "\"IP\""
        );
        assert_eq!(
            serde_json::to_string(&GeStatus::Tentative).unwrap(),
            "\"tentative\""
        );
    }
}
