//! Excel persistence integration tests
//! Templates are produced with the exporter, then read back through calamine

use pretty_assertions::assert_eq;
use royalbit_docfill::document::{CellCoordinate, CellRange, CellValue, Workbook};
use royalbit_docfill::excel::{ExcelExporter, ExcelImporter, FsTemplateSource};
use royalbit_docfill::render::render_plan;
use royalbit_docfill::types::RenderPlan;
use royalbit_docfill::FaultCode;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn template() -> Workbook {
    let mut workbook = Workbook::new();
    let summary = workbook.add_sheet("Summary");
    summary.set_cell(CellCoordinate::new(0, 0), "Customer".into());
    summary.set_cell(CellCoordinate::new(4, 1), CellValue::Formula("SUM(B2:B4)".to_string()));
    summary.set_cell(CellCoordinate::new(6, 0), "Signature".into());
    summary.add_merged_region(CellRange::parse("B1:D1").unwrap());

    let detail = workbook.add_sheet("Detail");
    detail.set_cell(CellCoordinate::new(0, 0), "SKU".into());
    detail.set_cell(CellCoordinate::new(0, 1), "Qty".into());
    detail.set_cell(CellCoordinate::new(1, 0), "Total".into());
    workbook
}

fn write_template(dir: &Path, name: &str) {
    ExcelExporter::new(&template()).export(&dir.join(name)).unwrap();
}

fn at(workbook: &Workbook, sheet: &str, reference: &str) -> CellValue {
    workbook
        .sheet_by_name(sheet)
        .map(|s| s.value_at(reference))
        .unwrap_or(CellValue::Empty)
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    write_template(dir.path(), "t.xlsx");

    let workbook = ExcelImporter::new(dir.path().join("t.xlsx")).import().unwrap();

    assert_eq!(workbook.sheet_names(), vec!["Summary", "Detail"]);
    assert_eq!(at(&workbook, "Summary", "A1"), CellValue::Text("Customer".to_string()));
    assert_eq!(
        at(&workbook, "Summary", "B5"),
        CellValue::Formula("SUM(B2:B4)".to_string())
    );
    assert_eq!(
        workbook.sheet_by_name("Summary").map(|s| s.merged_regions().to_vec()),
        Some(vec![CellRange::parse("B1:D1").unwrap()])
    );
    assert_eq!(at(&workbook, "Detail", "B1"), CellValue::Text("Qty".to_string()));
}

#[test]
fn test_import_from_buffer() {
    let bytes = ExcelExporter::new(&template()).export_to_buffer().unwrap();
    let workbook = ExcelImporter::import_bytes(bytes).unwrap();
    assert_eq!(workbook.sheets().len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

const PLAN: &str = r#"
namespace: tenant-a
sections:
  - sectionId: summary
    templateRef: "{kind}.xlsx"
    overwrite: true
    fieldMappings:
      B1: customer.name
      "B2:B5": amounts
  - sectionId: detail
    templateRef: "{kind}.xlsx"
    sheet: Detail
    fieldMappingGroups:
      - basePath: items
        repeatingGroup:
          startCell: A2
          insertRows: true
          fields:
            A: sku
            B: qty
"#;

#[test]
fn test_render_plan_from_filesystem_templates() {
    let root = TempDir::new().unwrap();
    let namespaced = root.path().join("tenant-a").join("templates");
    std::fs::create_dir_all(&namespaced).unwrap();
    write_template(&namespaced, "quote.xlsx");

    let mut plan: RenderPlan = serde_yaml::from_str(PLAN).unwrap();
    plan.variables.insert("kind".to_string(), "quote".to_string());
    let data = json!({
        "customer": {"name": "Acme"},
        "amounts": [10, 20, 30, 40],
        "items": [{"sku": "A-1", "qty": 2}, {"sku": "B-2", "qty": "5"}]
    });

    let source = FsTemplateSource::new(root.path());
    let documents = render_plan(&plan, &data, &source).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].reports.len(), 2);

    let out = root.path().join("out.xlsx");
    ExcelExporter::new(&documents[0].workbook).export(&out).unwrap();
    let rendered = ExcelImporter::new(&out).import().unwrap();

    assert_eq!(at(&rendered, "Summary", "B1"), CellValue::Text("Acme".to_string()));
    assert_eq!(at(&rendered, "Summary", "B4"), CellValue::Number(30.0));
    // Formula at B5 survives the range fill
    assert_eq!(
        at(&rendered, "Summary", "B5"),
        CellValue::Formula("SUM(B2:B4)".to_string())
    );
    assert_eq!(at(&rendered, "Detail", "A2"), CellValue::Text("A-1".to_string()));
    assert_eq!(at(&rendered, "Detail", "B3"), CellValue::Number(5.0));
    assert_eq!(at(&rendered, "Detail", "A4"), CellValue::Text("Total".to_string()));
}

#[test]
fn test_template_fault_codes() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("broken.xlsx"), b"garbage").unwrap();
    let source = FsTemplateSource::new(root.path());

    let cases = [
        ("missing.xlsx", FaultCode::TemplateNotFound),
        ("{unset}.xlsx", FaultCode::UnresolvedPlaceholder),
        ("broken.xlsx", FaultCode::TemplateParseFailed),
    ];
    for (reference, expected) in cases {
        let yaml = format!("sections:\n  - templateRef: \"{}\"\n", reference);
        let plan: RenderPlan = serde_yaml::from_str(&yaml).unwrap();
        let err = render_plan(&plan, &json!({}), &source).unwrap_err();
        assert_eq!(err.code(), expected, "{}", reference);
    }
}
