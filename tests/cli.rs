//! Integration tests for the reportline binary.

use std::fs;
use std::path::Path;
use std::process::Command;

use reportline_core::CellRef;
use reportline_core::storage::parse_workbook;
use tempfile::{TempDir, tempdir};

const EVIDENCE: &str = r#"[Ewidencja]
A1: "Evidence of working time {{year}}"
A2: "{{first_name}} {{last_name}}"
B2: "{{hours}}"
"#;

const ATTENDANCE: &str = r#"[Lista]
A1: "{{month}}/{{year}}"
A39: "{{last_name_1}}"
B39: "{{days_1}}"
C39: =B39 * 8
!C39: 0
A40: "{{last_name_2}}"
B40: "{{days_2}}"
C40: =B40 * 8
!C40: 0
"#;

/// Workspace with templates, an empty config and an output dir.
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    let templates = dir.path().join("templates");
    fs::create_dir(&templates).unwrap();
    fs::write(templates.join("evidence.grd"), EVIDENCE).unwrap();
    fs::write(templates.join("attendance_list.grd"), ATTENDANCE).unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "template_dir = \"templates\"\noutput_dir = \"out\"\n[attendance]\npage_capacity = 2\n",
    )
    .unwrap();
    dir
}

fn reportline(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_reportline"))
        .current_dir(dir)
        .args(["-c", "config.toml"])
        .args(args)
        .output()
        .expect("Failed to execute reportline");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_evidence_report_is_written() {
    let dir = workspace();
    fs::write(
        dir.path().join("jan.toml"),
        "year = 2024\nfirst_name = \"Jan\"\nlast_name = \"Kowalski\"\nhours = 37.5\n",
    )
    .unwrap();

    let (stdout, stderr, code) = reportline(dir.path(), &["evidence", "jan.toml"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.trim().ends_with("evidence_Kowalski_2024.grd"));

    let workbook = parse_workbook(&dir.path().join("out/evidence_Kowalski_2024.grd")).unwrap();
    let sheet = workbook.sheet_by_name("Ewidencja").unwrap();
    assert_eq!(sheet.text_of(&CellRef::parse("A2").unwrap()), "Jan Kowalski");
    assert_eq!(sheet.text_of(&CellRef::parse("B2").unwrap()), "37.5");
}

#[test]
fn test_attendance_pages_filtered_and_sorted() {
    let dir = workspace();
    fs::write(
        dir.path().join("march.toml"),
        r#"
month = 3
year = 2024

[[entities]]
last_name = "Nowak"
days = 20
ec = true

[[entities]]
last_name = "adamska"
days = 18
ec = true

[[entities]]
last_name = "Zawada"
days = 1
ec = false

[[entities]]
last_name = "Bielecki"
days = 21
ec = true
"#,
    )
    .unwrap();

    let (stdout, stderr, code) = reportline(dir.path(), &["attendance", "march.toml"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout.lines().count(), 2);

    let first = parse_workbook(&dir.path().join("out/attendance_list_3_2024_1.grd")).unwrap();
    let sheet = first.sheet(0).unwrap();
    assert_eq!(sheet.text_of(&CellRef::parse("A39").unwrap()), "adamska");
    assert_eq!(sheet.text_of(&CellRef::parse("A40").unwrap()), "Bielecki");
    assert_eq!(sheet.text_of(&CellRef::parse("C40").unwrap()), "168");

    let second = parse_workbook(&dir.path().join("out/attendance_list_3_2024_2.grd")).unwrap();
    let sheet = second.sheet(0).unwrap();
    assert_eq!(sheet.text_of(&CellRef::parse("A39").unwrap()), "Nowak");
    assert_eq!(sheet.text_of(&CellRef::parse("C39").unwrap()), "160");
    // unused row keeps the template's cached result
    assert_eq!(sheet.text_of(&CellRef::parse("C40").unwrap()), "0");
}

#[test]
fn test_missing_binding_writes_nothing() {
    let dir = workspace();
    fs::write(dir.path().join("jan.toml"), "year = 2024\nlast_name = \"Kowalski\"\n").unwrap();

    let (_, stderr, code) = reportline(dir.path(), &["evidence", "jan.toml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("first_name"), "stderr: {stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_capacity_larger_than_summary_rows_is_refused() {
    let dir = workspace();
    fs::write(
        dir.path().join("config.toml"),
        "template_dir = \"templates\"\noutput_dir = \"out\"\n[attendance]\npage_capacity = 6\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("march.toml"),
        "month = 3\nyear = 2024\n\n[[entities]]\nlast_name = \"Nowak\"\ndays = 20\nec = true\n",
    )
    .unwrap();

    let (_, stderr, code) = reportline(dir.path(), &["attendance", "march.toml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid page capacity 6"), "stderr: {stderr}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_missing_template_is_reported() {
    let dir = workspace();
    fs::remove_file(dir.path().join("templates/evidence.grd")).unwrap();
    fs::write(
        dir.path().join("jan.toml"),
        "year = 2024\nfirst_name = \"Jan\"\nlast_name = \"Kowalski\"\nhours = 1\n",
    )
    .unwrap();

    let (_, stderr, code) = reportline(dir.path(), &["evidence", "jan.toml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"), "stderr: {stderr}");
}

#[test]
fn test_unknown_report() {
    let dir = workspace();
    fs::write(dir.path().join("x.toml"), "").unwrap();
    let (_, stderr, code) = reportline(dir.path(), &["payroll", "x.toml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown report"));
}

#[test]
fn test_usage_errors() {
    let dir = workspace();
    let (_, stderr, code) = reportline(dir.path(), &["evidence"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Usage: reportline"));
}
