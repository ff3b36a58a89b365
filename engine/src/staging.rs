//! The mutable staging map threaded through reconciliation stages.

use std::collections::BTreeSet;

use gradmap_types::{NodeEntry, NodeId, ReconciliationResult, ScheduleLabel, sanitize_note_text};

/// Label/note state under construction.
///
/// Seeded from the currently displayed state so manual edits are visible to
/// every stage; only [`Staging::into_result`] turns it back into a result.
#[derive(Debug, Clone, Default)]
pub struct Staging {
    entries: ReconciliationResult,
    struck: BTreeSet<NodeId>,
}

impl Staging {
    #[must_use]
    pub fn seeded(displayed: &ReconciliationResult) -> Self {
        Self {
            entries: displayed.clone(),
            struck: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn entry(&self, id: &NodeId) -> Option<&NodeEntry> {
        self.entries.get(id)
    }

    /// A label is already set (by a user or an earlier stage).
    #[must_use]
    pub fn is_occupied(&self, id: &NodeId) -> bool {
        self.entry(id).is_some_and(|e| e.label.is_some())
    }

    /// Neither label nor note is set.
    #[must_use]
    pub fn is_unused(&self, id: &NodeId) -> bool {
        self.entry(id).is_none_or(NodeEntry::is_empty)
    }

    #[must_use]
    pub fn has_note(&self, id: &NodeId) -> bool {
        self.entry(id).is_some_and(|e| e.note.is_some())
    }

    pub fn set_label(&mut self, id: &NodeId, label: ScheduleLabel) {
        self.entries.entry_mut(id).label = Some(label);
    }

    /// Store a sanitized note; notes that sanitize to nothing are not stored.
    pub fn set_note(&mut self, id: &NodeId, note: &str) {
        let note = sanitize_note_text(note);
        if !note.is_empty() {
            self.entries.entry_mut(id).note = Some(note.into_owned());
        }
    }

    /// Strike a node during the completion pass and remember it.
    pub fn strike(&mut self, id: &NodeId) {
        self.set_label(id, ScheduleLabel::Strike);
        self.struck.insert(id.clone());
    }

    /// Nodes struck by the completion pass, in id order.
    #[must_use]
    pub fn struck(&self) -> &BTreeSet<NodeId> {
        &self.struck
    }

    #[must_use]
    pub fn into_result(self) -> ReconciliationResult {
        self.entries.compacted()
    }
}
