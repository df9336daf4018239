//! CLI integration tests for the docfill binary

use assert_cmd::Command;
use predicates::prelude::*;
use royalbit_docfill::document::{CellCoordinate, CellValue, Workbook};
use royalbit_docfill::excel::{ExcelExporter, ExcelImporter};
use std::path::Path;
use tempfile::TempDir;

fn docfill() -> Command {
    Command::cargo_bin("docfill").unwrap()
}

fn write_template(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_sheet("Sheet1");
    sheet.set_cell(CellCoordinate::new(0, 0), "Name".into());
    sheet.set_cell(CellCoordinate::new(3, 0), CellValue::Formula("1+1".to_string()));
    ExcelExporter::new(&workbook).export(path).unwrap();
}

const PLAN: &str = r#"
sections:
  - sectionId: main
    templateRef: "{kind}.xlsx"
    overwrite: true
    fieldMappings:
      B1: customer.name
      "A2:B3": grid
      "Nope!A1": customer.name
    fieldMappingGroups:
      - basePath: children
        repeatingGroup:
          prefix: child
          indexSeparator: "_"
          fields:
            firstName: firstName
"#;

const DATA: &str = r#"{
  "customer": {"name": "Acme"},
  "grid": [[1, "x"], [2, "y"]],
  "children": [{"firstName": "Ann"}, {"firstName": "Ben"}],
  "plans": [
    {"planName": "Basic", "benefits": [{"name": "Dental", "value": "No"}]},
    {"planName": "Plus", "benefits": [{"name": "Vision", "value": "Yes"}, {"name": "dental", "value": "Yes"}]}
  ]
}"#;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_template(&dir.path().join("quote.xlsx"));
    std::fs::write(dir.path().join("plan.yaml"), PLAN).unwrap();
    std::fs::write(dir.path().join("data.json"), DATA).unwrap();
    dir
}

// ═══════════════════════════════════════════════════════════════════════════
// RENDER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_render_writes_output_and_reports_warnings() {
    let dir = setup();
    let out = dir.path().join("out.xlsx");
    let fields = dir.path().join("fields.json");

    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(&out)
        .arg("-t")
        .arg(dir.path())
        .arg("--var")
        .arg("kind=quote")
        .arg("--fields-out")
        .arg(&fields)
        .assert()
        .success()
        .stdout(predicate::str::contains("UNKNOWN_SHEET"))
        .stdout(predicate::str::contains("1 warning"));

    let rendered = ExcelImporter::new(&out).import().unwrap();
    let sheet = rendered.sheet(0).unwrap();
    assert_eq!(sheet.value_at("B1"), CellValue::Text("Acme".to_string()));
    assert_eq!(sheet.value_at("A2"), CellValue::Number(1.0));
    assert_eq!(sheet.value_at("A4"), CellValue::Formula("1+1".to_string()));

    let json = std::fs::read_to_string(&fields).unwrap();
    assert!(json.contains("child2_firstName"));
    assert!(json.contains("Ben"));
}

#[test]
fn test_render_strict_fails_on_warnings() {
    let dir = setup();
    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .arg("--var")
        .arg("kind=quote")
        .arg("--strict")
        .env("DOCFILL_TEMPLATE_ROOT", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn test_render_unresolved_placeholder_fails() {
    let dir = setup();
    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .arg("-t")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("UNRESOLVED_PLACEHOLDER"));
}

#[test]
fn test_render_missing_template_fails() {
    let dir = setup();
    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .arg("-t")
        .arg(dir.path())
        .arg("--var")
        .arg("kind=other")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEMPLATE_NOT_FOUND"));
}

#[test]
fn test_render_logs_warnings_by_default() {
    let dir = setup();
    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .arg("-t")
        .arg(dir.path())
        .arg("--var")
        .arg("kind=quote")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("UNKNOWN_SHEET"))
        .stderr(predicate::str::contains("Rendered section"))
        .stderr(predicate::str::contains("Filled range").not());
}

#[test]
fn test_render_verbose_logs_mapping_detail() {
    let dir = setup();
    docfill()
        .arg("render")
        .arg(dir.path().join("plan.yaml"))
        .arg(dir.path().join("data.json"))
        .arg("-o")
        .arg(dir.path().join("out.xlsx"))
        .arg("-t")
        .arg(dir.path())
        .arg("--var")
        .arg("kind=quote")
        .arg("--verbose")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("Filled range"))
        .stderr(predicate::str::contains("Imported sheet"))
        .stderr(predicate::str::contains("UNKNOWN_SHEET"));
}

// ═══════════════════════════════════════════════════════════════════════════
// MATRIX
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_matrix_prints_json() {
    let dir = setup();
    let output = docfill()
        .arg("matrix")
        .arg(dir.path().join("data.json"))
        .arg("--column-spacing")
        .arg("0")
        .output()
        .unwrap();

    assert!(output.status.success());
    let matrix: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        matrix,
        serde_json::json!([
            ["Benefit", "Basic", "Plus"],
            ["Dental", "No", "Yes"],
            ["Vision", "", "Yes"]
        ])
    );
}

#[test]
fn test_matrix_values_only_yaml() {
    let dir = setup();
    docfill()
        .arg("matrix")
        .arg(dir.path().join("data.json"))
        .arg("--values-only")
        .arg("--yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Basic"))
        .stdout(predicate::str::contains("Benefit").not());
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_inspect_lists_sheets_and_formulas() {
    let dir = setup();
    docfill()
        .arg("inspect")
        .arg(dir.path().join("quote.xlsx"))
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sheet1"))
        .stdout(predicate::str::contains("Formulas:  1"))
        .stdout(predicate::str::contains("=1+1"));
}

#[test]
fn test_inspect_missing_file() {
    docfill()
        .arg("inspect")
        .arg("/nonexistent/template.xlsx")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEMPLATE_NOT_FOUND"));
}
