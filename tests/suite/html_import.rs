//! Markup audit import, end to end.

use pretty_assertions::assert_eq;

use gradmap_audit::{AuditSettings, ErrorCode, extract_evidence};
use gradmap_engine::ReconciliationEngine;
use gradmap_types::{
    CourseCode, CurriculumNode, GeStatus, NodeCategory, ReconciliationResult, ScheduleLabel,
};

use crate::common::{HTML_AUDIT, evidence, import};

fn code(s: &str) -> CourseCode {
    CourseCode::from_canonical(s)
}

#[test]
fn rows_come_from_outer_tables_only() {
    let evidence = evidence(HTML_AUDIT);
    assert_eq!(
        evidence.passed.iter().map(CourseCode::as_str).collect::<Vec<_>>(),
        ["CPSC 120A", "CPSC 120L", "PHIL 101"]
    );
    assert_eq!(
        evidence.ip.iter().map(CourseCode::as_str).collect::<Vec<_>>(),
        ["CPSC 131"]
    );
    assert!(!evidence.passed.contains(&code("MATH 150A")));
}

#[test]
fn requirement_block_certifies_american_institutions() {
    let evidence = evidence(HTML_AUDIT);
    let record = evidence.ge_slots.get("AI").unwrap();
    assert_eq!(record.status, GeStatus::Complete);
    assert_eq!(record.note.as_deref(), Some("Certified"));
}

#[test]
fn html_audit_reconciles_onto_curriculum() {
    let result = import(HTML_AUDIT, &ReconciliationResult::new(), None);
    assert_eq!(result.label("n1"), Some(&ScheduleLabel::Strike));
    assert_eq!(result.label("n3"), Some(&ScheduleLabel::InProgress));
    assert_eq!(result.label("n2"), None);

    // No GE headers: named slots only get their bare key, and the certified
    // requirement takes the first generic placeholder.
    assert_eq!(result.note("g1"), Some("A.1"));
    assert_eq!(result.label("g1"), None);
    assert_eq!(result.note("g4"), Some("AI (Certified)"));
    assert_eq!(result.label("g4"), Some(&ScheduleLabel::Strike));
}

#[test]
fn substitution_notes_struck_node() {
    let settings = AuditSettings::default();
    let evidence = extract_evidence(HTML_AUDIT, &settings).unwrap();
    let nodes = vec![
        CurriculumNode::new("p1", "PHIL 101", NodeCategory::Other("major".to_string())),
        CurriculumNode::new("ai", "GE", NodeCategory::GeneralEducation)
            .with_label("American Institutions"),
    ];
    let result = ReconciliationEngine::default().reconcile(
        &evidence,
        &nodes,
        &ReconciliationResult::new(),
        None,
    );

    assert_eq!(result.label("p1"), Some(&ScheduleLabel::Strike));
    assert_eq!(result.note("p1"), Some("PHIL 100"));
    assert_eq!(result.label("ai"), Some(&ScheduleLabel::Strike));
    assert_eq!(result.note("ai"), Some("AI (Certified)"));
}

#[test]
fn unreadable_documents_are_errors() {
    let settings = AuditSettings::default();
    assert_eq!(
        extract_evidence("", &settings).unwrap_err().code,
        ErrorCode::EmptyDocument
    );
    assert_eq!(
        extract_evidence("%PDF-1.7\n...", &settings).unwrap_err().code,
        ErrorCode::UnsupportedDocument
    );
}
