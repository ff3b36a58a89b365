//! Curriculum graph nodes (read-only here) and the per-node result map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node category as tagged by the curriculum graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeCategory {
    GeneralEducation,
    TechnicalElective,
    Other(String),
}

impl NodeCategory {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeCategory::GeneralEducation => "ge",
            NodeCategory::TechnicalElective => "tech",
            NodeCategory::Other(name) => name,
        }
    }
}

impl From<String> for NodeCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ge" | "general-education" | "general_education" | "gen-ed" => {
                NodeCategory::GeneralEducation
            }
            "tech" | "te" | "technical-elective" | "technical_elective" | "tech-elective" => {
                NodeCategory::TechnicalElective
            }
            _ => NodeCategory::Other(value),
        }
    }
}

impl From<NodeCategory> for String {
    fn from(value: NodeCategory) -> Self {
        value.as_str().to_string()
    }
}

/// One node of the external curriculum graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumNode {
    pub id: NodeId,
    pub code: String,
    pub category: NodeCategory,
    /// Display label, when it differs from the code (`"GE Area C.3/Z"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prereqs: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coreqs: Vec<NodeId>,
}

impl CurriculumNode {
    #[must_use]
    pub fn new(id: impl Into<String>, code: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: NodeId::new(id),
            code: code.into(),
            category,
            label: None,
            prereqs: Vec::new(),
            coreqs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label shown on the flowchart: the explicit label, else the code.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.code)
    }
}

/// Schedule cell value for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScheduleLabel {
    InProgress,
    Review,
    /// Completed; rendered as a strike-through.
    Strike,
    /// A planned term such as `"Fall 2025"`, only ever set by the user.
    Season(String),
}

impl ScheduleLabel {
    pub const IN_PROGRESS: &'static str = "In Prog.";
    pub const REVIEW: &'static str = "Review";
    pub const STRIKE: &'static str = "__strike__";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ScheduleLabel::InProgress => Self::IN_PROGRESS,
            ScheduleLabel::Review => Self::REVIEW,
            ScheduleLabel::Strike => Self::STRIKE,
            ScheduleLabel::Season(season) => season,
        }
    }
}

impl From<String> for ScheduleLabel {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::IN_PROGRESS => ScheduleLabel::InProgress,
            Self::REVIEW => ScheduleLabel::Review,
            Self::STRIKE => ScheduleLabel::Strike,
            _ => ScheduleLabel::Season(value),
        }
    }
}

impl From<ScheduleLabel> for String {
    fn from(value: ScheduleLabel) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<ScheduleLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NodeEntry {
    /// Neither a label nor a note is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.note.is_none()
    }
}

/// Label/note per node id.
///
/// The same shape carries manual overrides back into the engine as the
/// currently displayed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReconciliationResult(BTreeMap<NodeId, NodeEntry>);

impl ReconciliationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&NodeEntry> {
        self.0.get(id)
    }

    #[must_use]
    pub fn label(&self, id: &str) -> Option<&ScheduleLabel> {
        self.0.get(&NodeId::new(id)).and_then(|e| e.label.as_ref())
    }

    #[must_use]
    pub fn note(&self, id: &str) -> Option<&str> {
        self.0.get(&NodeId::new(id)).and_then(|e| e.note.as_deref())
    }

    pub fn entry_mut(&mut self, id: &NodeId) -> &mut NodeEntry {
        self.0.entry(id.clone()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeEntry)> {
        self.0.iter()
    }

    /// Drop entries that carry neither label nor note.
    #[must_use]
    pub fn compacted(mut self) -> Self {
        self.0.retain(|_, entry| !entry.is_empty());
        self
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

impl FromIterator<(NodeId, NodeEntry)> for ReconciliationResult {
    fn from_iter<T: IntoIterator<Item = (NodeId, NodeEntry)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
