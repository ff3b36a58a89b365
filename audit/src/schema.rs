//! General-education requirement schemas and header-driven text slicing.
//!
//! Each schema is a table of slots. A slot's text window starts at its header
//! and ends at the nearest later header of any other slot or boundary marker.

use std::sync::LazyLock;

use regex::Regex;

/// One general-education slot: key, human title, and the header shapes that open it.
#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub key: &'static str,
    pub title: &'static str,
    /// Regex for the area tag (`A\.?1`).
    code: &'static str,
    /// Regex for the title words.
    title_pattern: &'static str,
}

/// Two slots that jointly satisfy one flowchart requirement.
#[derive(Debug, Clone, Copy)]
pub struct DualSlot {
    /// Key of the merged requirement (`"C.3/Z"`).
    pub key: &'static str,
    pub sides: [&'static str; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Legacy,
    Modern,
}

impl SchemaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Legacy => "legacy",
            SchemaKind::Modern => "modern",
        }
    }
}

const LEGACY_SLOTS: &[SlotSpec] = &[
    SlotSpec {
        key: "A.1",
        title: "Oral Communication",
        code: r"A\.?1",
        title_pattern: r"Oral\s+Communication",
    },
    SlotSpec {
        key: "A.2",
        title: "Written Communication",
        code: r"A\.?2",
        title_pattern: r"Written\s+Communication",
    },
    SlotSpec {
        key: "A.3",
        title: "Critical Thinking",
        code: r"A\.?3",
        title_pattern: r"Critical\s+Thinking",
    },
    SlotSpec {
        key: "B.4",
        title: "Mathematics/Quantitative Reasoning",
        code: r"B\.?4",
        title_pattern: r"Mathematics\s*/?\s*Quantitative\s+Reasoning",
    },
    SlotSpec {
        key: "C.3",
        title: "Explorations in the Arts or Humanities",
        code: r"C\.?3",
        title_pattern: r"Explorations\s+in\s+(?:the\s+)?Arts\s+(?:or|and|&)\s+Humanities",
    },
    SlotSpec {
        key: "Z",
        title: "Cultural Diversity",
        code: r"Z",
        title_pattern: r"Cultural\s+Diversity",
    },
];

const MODERN_SLOTS: &[SlotSpec] = &[
    SlotSpec {
        key: "1A",
        title: "English Composition",
        code: r"1A",
        title_pattern: r"English\s+Composition",
    },
    SlotSpec {
        key: "1B",
        title: "Critical Thinking",
        code: r"1B",
        title_pattern: r"Critical\s+Thinking(?:\s+and\s+Composition)?",
    },
    SlotSpec {
        key: "1C",
        title: "Oral Communication",
        code: r"1C",
        title_pattern: r"Oral\s+Communication",
    },
    SlotSpec {
        key: "2",
        title: "Mathematical Concepts",
        code: r"2",
        title_pattern: r"Mathematical\s+Concepts(?:\s+and\s+Quantitative\s+Reasoning)?",
    },
    SlotSpec {
        key: "3U",
        title: "Upper-Division Arts and Humanities",
        code: r"3U",
        title_pattern: r"Upper[\s\-]*Division\s+Arts\s+(?:and|&)\s+Humanities",
    },
    SlotSpec {
        key: "Z",
        title: "Cultural Diversity",
        code: r"Z",
        title_pattern: r"Cultural\s+Diversity",
    },
];

/// Section headers that end a GE slice without being GE slots themselves.
const BOUNDARY_MARKERS: &[&str] = &[
    r"Technical\s+Electives",
    r"Major\s+Requirements",
    r"Upper[\s\-]*Division\s+Writing",
    r"Unit\s+Requirements",
    r"American\s+Institutions",
];

static MODERN_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"(?i)\bCal[\s\-]?GETC\b|\bArea\s+1[ABC]\b",
            r"|\bEnglish\s+Communication\s+and\s+Critical\s+Thinking\b",
        ),
    )
    .expect("valid modern schema regex")
});

static SCHEMAS: LazyLock<[GeSchema; 2]> = LazyLock::new(|| {
    [
        GeSchema::compile(
            SchemaKind::Legacy,
            LEGACY_SLOTS,
            DualSlot {
                key: "C.3/Z",
                sides: ["C.3", "Z"],
            },
        ),
        GeSchema::compile(
            SchemaKind::Modern,
            MODERN_SLOTS,
            DualSlot {
                key: "3U/Z",
                sides: ["3U", "Z"],
            },
        ),
    ]
});

static BOUNDARIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BOUNDARY_MARKERS
        .iter()
        .map(|pattern| Regex::new(&format!(r"(?i)\b{pattern}\b")).expect("valid boundary regex"))
        .collect()
});

#[derive(Debug)]
struct CompiledSlot {
    spec: SlotSpec,
    header: Regex,
    name: Regex,
}

#[derive(Debug)]
pub struct GeSchema {
    kind: SchemaKind,
    slots: Vec<CompiledSlot>,
    dual: DualSlot,
}

impl GeSchema {
    fn compile(kind: SchemaKind, specs: &[SlotSpec], dual: DualSlot) -> Self {
        let slots = specs
            .iter()
            .map(|spec| {
                let (code, title) = (spec.code, spec.title_pattern);
                let forward = format!(r"\b(?:Area\s+)?{code}\b\W{{0,3}}{title}");
                let reverse = format!(r"\b{title}\W{{0,3}}\(?(?:Area\s+)?{code}\b");
                CompiledSlot {
                    spec: *spec,
                    header: Regex::new(&format!("(?i)(?:{forward}|{reverse})"))
                        .expect("valid slot header regex"),
                    name: Regex::new(&format!(r"(?i)(?:\bArea\s+{code}\b|\b{title}\b)"))
                        .expect("valid slot name regex"),
                }
            })
            .collect();
        Self { kind, slots, dual }
    }

    /// Modern schema when any modern header phrase appears anywhere.
    #[must_use]
    pub fn detect(text: &str) -> &'static GeSchema {
        let [legacy, modern] = &*SCHEMAS;
        if MODERN_PHRASES.is_match(text) {
            modern
        } else {
            legacy
        }
    }

    #[must_use]
    pub fn legacy() -> &'static GeSchema {
        &SCHEMAS[0]
    }

    #[must_use]
    pub fn modern() -> &'static GeSchema {
        &SCHEMAS[1]
    }

    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter().map(|s| &s.spec)
    }

    #[must_use]
    pub fn dual(&self) -> DualSlot {
        self.dual
    }

    /// Slot whose title or `Area <tag>` appears in a requirement name.
    #[must_use]
    pub fn slot_named(&self, name: &str) -> Option<&SlotSpec> {
        self.slots
            .iter()
            .find(|slot| slot.name.is_match(name))
            .map(|slot| &slot.spec)
    }

    /// Text from the slot's first header up to the nearest later header of any
    /// other slot, built-in boundary, or `extra` marker.
    #[must_use]
    pub fn slice<'t>(&self, text: &'t str, key: &str, extra: &[Regex]) -> Option<&'t str> {
        let slot = self.slots.iter().find(|s| s.spec.key == key)?;
        let start = slot.header.find(text)?;

        let end = self
            .slots
            .iter()
            .filter(|other| other.spec.key != key)
            .map(|other| &other.header)
            .chain(BOUNDARIES.iter())
            .chain(extra.iter())
            .filter_map(|pattern| pattern.find_at(text, start.end()))
            .map(|m| m.start())
            .min()
            .unwrap_or(text.len());

        Some(&text[start.start()..end])
    }
}

/// Compile configured boundary markers as literal, case-insensitive phrases.
#[must_use]
pub fn literal_markers(markers: &[String]) -> Vec<Regex> {
    markers
        .iter()
        .filter_map(|marker| Regex::new(&format!(r"(?i){}", regex::escape(marker))).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{GeSchema, SchemaKind, literal_markers};

    const LEGACY: &str = "General Education A.1 Oral Communication FA23 COMM 102 3.0 A \
        A.2 Written Communication FA23 ENGL 101 3.0 B \
        C.3 Explorations in the Arts or Humanities SP24 PHIL 101 3.0 A \
        Z Cultural Diversity Not fulfilled \
        Technical Electives CPSC 440 3.0 A";

    #[test]
    fn detects_schema_by_phrase() {
        assert_eq!(GeSchema::detect(LEGACY).kind(), SchemaKind::Legacy);
        assert_eq!(
            GeSchema::detect("Cal-GETC Area 1A English Composition").kind(),
            SchemaKind::Modern
        );
        assert_eq!(
            GeSchema::detect("English Communication and Critical Thinking").kind(),
            SchemaKind::Modern
        );
    }

    #[test]
    fn both_schemas_have_six_slots() {
        assert_eq!(GeSchema::legacy().slots().count(), 6);
        assert_eq!(GeSchema::modern().slots().count(), 6);
        assert_eq!(GeSchema::modern().dual().key, "3U/Z");
    }

    #[test]
    fn slice_ends_at_nearest_later_header() {
        let schema = GeSchema::legacy();
        assert_eq!(
            schema.slice(LEGACY, "A.1", &[]),
            Some("A.1 Oral Communication FA23 COMM 102 3.0 A ")
        );
        assert_eq!(
            schema.slice(LEGACY, "Z", &[]),
            Some("Z Cultural Diversity Not fulfilled ")
        );
        assert_eq!(schema.slice(LEGACY, "B.4", &[]), None);
    }

    #[test]
    fn slice_runs_to_end_without_later_header() {
        let schema = GeSchema::legacy();
        let text = "Written Communication (A.2) FA23 ENGL 101 3.0 B";
        assert_eq!(schema.slice(text, "A.2", &[]), Some(text));
    }

    #[test]
    fn extra_markers_bound_slices() {
        let schema = GeSchema::legacy();
        let text =
            "A.1 Oral Communication FA23 COMM 102 3.0 A Minor Requirements FA23 COMM 300 3.0 A";
        let extra = literal_markers(&["minor requirements".to_string()]);
        assert_eq!(
            schema.slice(text, "A.1", &extra),
            Some("A.1 Oral Communication FA23 COMM 102 3.0 A ")
        );
    }

    #[test]
    fn slot_named_matches_title_or_area_tag() {
        let schema = GeSchema::legacy();
        assert_eq!(schema.slot_named("GE Area B.4").map(|s| s.key), Some("B.4"));
        assert_eq!(
            schema.slot_named("Cultural Diversity Requirement").map(|s| s.key),
            Some("Z")
        );
        assert!(schema.slot_named("Residence").is_none());
    }
}
