//! Plain-text audit import, end to end.

use pretty_assertions::assert_eq;

use gradmap_types::{CourseCode, GeStatus, ReconciliationResult, ScheduleLabel, SlotKey};

use crate::common::{TEXT_AUDIT, displayed_state, evidence, import, note_templates};

fn code(s: &str) -> CourseCode {
    CourseCode::from_canonical(s)
}

#[test]
fn text_audit_evidence() {
    let evidence = evidence(TEXT_AUDIT);

    for passed in ["COMM 100", "CPSC 120A", "CPSC 120L", "CPSC 121A", "ETHN 101"] {
        assert!(evidence.passed.contains(&code(passed)), "{passed} should be passed");
    }
    assert_eq!(
        evidence.ip.iter().map(CourseCode::as_str).collect::<Vec<_>>(),
        ["CPSC 121L", "MATH 150A"]
    );

    let keys: Vec<&str> = evidence.ge_slots.keys().map(SlotKey::as_str).collect();
    assert_eq!(keys, ["A.1", "A.2", "A.3", "B.4", "C.3/Z"]);
    assert_eq!(evidence.ge_slots.get("A.2").unwrap().status, GeStatus::Missing);
    assert_eq!(
        evidence.ge_slots.get("C.3/Z").unwrap().code,
        Some(code("ETHN 101"))
    );

    assert_eq!(evidence.tech.completed, [code("CPSC 362")]);
    assert_eq!(evidence.tech.ip, [code("CPSC 386")]);
}

#[test]
fn text_audit_reconciles_onto_curriculum() {
    let result = import(TEXT_AUDIT, &displayed_state(), Some(&note_templates()));

    insta::assert_json_snapshot!(result, @r#"
    {
      "g1": {
        "label": "__strike__",
        "note": "COMM 100 (A.1)"
      },
      "g2": {
        "label": "In Prog.",
        "note": "MATH 150A (B.4)"
      },
      "g3": {
        "label": "__strike__",
        "note": "ETHN 101 (C.3/Z)"
      },
      "g4": {
        "note": "A.2"
      },
      "n1": {
        "label": "__strike__"
      },
      "n2": {
        "label": "In Prog."
      },
      "n3": {
        "label": "Spring 2026",
        "note": "Take with MATH 170A"
      },
      "t1": {
        "label": "__strike__",
        "note": "CPSC 362"
      },
      "t2": {
        "label": "In Prog.",
        "note": "CPSC 386"
      }
    }
    "#);
}

#[test]
fn reimport_over_own_result_changes_nothing() {
    let first = import(TEXT_AUDIT, &ReconciliationResult::new(), None);
    let second = import(TEXT_AUDIT, &first, None);
    assert_eq!(first, second);
}

#[test]
fn lone_lecture_part_is_not_completion() {
    let result = import("FA24 CPSC 120A 2.0 A", &ReconciliationResult::new(), None);
    assert_eq!(result.label("n1"), Some(&ScheduleLabel::InProgress));
}
