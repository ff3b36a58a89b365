//! The `gradmap` binary: file acquisition, config, and stdout contract.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::tempdir;

use crate::common::fixture_path;

fn gradmap(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gradmap"))
        .args(args)
        .env("HOME", home)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn fixture(name: &str) -> String {
    fixture_path(name).to_string_lossy().into_owned()
}

#[test]
fn prints_reconciliation_json_on_stdout() {
    let home = tempdir().unwrap();
    let output = gradmap(
        home.path(),
        &[
            &fixture("audit.txt"),
            &fixture("curriculum.json"),
            "--state",
            &fixture("state.json"),
            "--notes",
            &fixture("cpsc.toml"),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["n1"]["label"], "__strike__");
    assert_eq!(result["n3"]["label"], "Spring 2026");
    assert_eq!(result["n3"]["note"], "Take with MATH 170A");
    assert_eq!(result["t2"]["note"], "CPSC 386");
}

#[test]
fn evidence_mode_prints_extracted_sets() {
    let home = tempdir().unwrap();
    let output = gradmap(home.path(), &[&fixture("audit.html"), "--evidence"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let evidence: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(evidence["ip"], serde_json::json!(["CPSC 131"]));
    assert_eq!(evidence["substitutions"]["PHIL 101"], "PHIL 100");
}

#[test]
fn config_whitelist_and_notes_dir_apply() {
    let home = tempdir().unwrap();
    let notes_dir = home.path().join("notes");
    fs::create_dir_all(&notes_dir).unwrap();
    fs::write(
        notes_dir.join("cpsc.toml"),
        "[notes]\n\"CPSC 121\" = \"Lab and lecture together\"\n",
    )
    .unwrap();

    let config_dir = home.path().join(".gradmap");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[notes]\ndir = {:?}\n\n[engine]\nstrike_whitelist = [\"COMM 100\"]\n",
            notes_dir.to_string_lossy()
        ),
    )
    .unwrap();

    let audit = home.path().join("audit.txt");
    fs::write(&audit, "FA23 COMM 100 3.0 A").unwrap();
    let curriculum = home.path().join("curriculum.json");
    fs::write(
        &curriculum,
        r#"[
            {"id": "g1", "code": "COMM 100", "category": "ge"},
            {"id": "n2", "code": "CPSC 121", "category": "major"}
        ]"#,
    )
    .unwrap();

    let output = gradmap(
        home.path(),
        &[
            &audit.to_string_lossy(),
            &curriculum.to_string_lossy(),
            "--program",
            "cpsc",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["g1"]["label"], "__strike__");
    assert_eq!(result["n2"]["note"], "Lab and lecture together");
}

#[test]
fn empty_audit_fails_with_context() {
    let home = tempdir().unwrap();
    let audit = home.path().join("empty.txt");
    fs::write(&audit, "  \n").unwrap();

    let output = gradmap(
        home.path(),
        &[&audit.to_string_lossy(), &fixture("curriculum.json")],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to extract evidence"), "{stderr}");
    assert!(stderr.contains("audit document is empty"), "{stderr}");
}

#[test]
fn missing_curriculum_is_a_usage_error() {
    let home = tempdir().unwrap();
    let output = gradmap(home.path(), &[&fixture("audit.txt")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<CURRICULUM>"), "{stderr}");
    assert!(stderr.contains("Usage: gradmap"), "{stderr}");
}
