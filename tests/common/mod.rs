//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use gradmap_audit::{AuditSettings, extract_evidence};
use gradmap_engine::{NoteTemplates, ReconciliationEngine};
use gradmap_types::{CurriculumNode, Evidence, ReconciliationResult};

pub const TEXT_AUDIT: &str = include_str!("../fixtures/audit.txt");
pub const HTML_AUDIT: &str = include_str!("../fixtures/audit.html");
pub const CURRICULUM: &str = include_str!("../fixtures/curriculum.json");
pub const NOTES: &str = include_str!("../fixtures/cpsc.toml");
pub const STATE: &str = include_str!("../fixtures/state.json");

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn curriculum() -> Vec<CurriculumNode> {
    serde_json::from_str(CURRICULUM).unwrap()
}

pub fn displayed_state() -> ReconciliationResult {
    serde_json::from_str(STATE).unwrap()
}

pub fn evidence(raw: &str) -> Evidence {
    extract_evidence(raw, &AuditSettings::default()).unwrap()
}

/// Extract and reconcile with default settings.
pub fn import(
    raw: &str,
    displayed: &ReconciliationResult,
    templates: Option<&NoteTemplates>,
) -> ReconciliationResult {
    let settings = AuditSettings::default();
    let evidence = extract_evidence(raw, &settings).unwrap();
    ReconciliationEngine::default().reconcile(&evidence, &curriculum(), displayed, templates)
}

pub fn note_templates() -> NoteTemplates {
    NoteTemplates::parse("cpsc", NOTES, &AuditSettings::default().normalizer).unwrap()
}
