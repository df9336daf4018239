//! Excel exporter - in-memory `Workbook` → .xlsx
//!
//! Writes cell values, formulas and merged regions. Byte-level styling from
//! the original template is not carried over.

use crate::document::{CellValue, MergedRegionGuard, Sheet, Workbook};
use crate::error::{DocfillError, DocfillResult};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};
use std::path::Path;
use tracing::debug;

/// Serializes a rendered document
pub struct ExcelExporter<'a> {
    workbook: &'a Workbook,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self { workbook }
    }

    /// Write the workbook to `output_path`
    pub fn export(&self, output_path: &Path) -> DocfillResult<()> {
        let mut xlsx = self.build()?;
        xlsx.save(output_path)
            .map_err(|e| DocfillError::Export(format!("Failed to save Excel file: {}", e)))?;
        debug!(path = %output_path.display(), "Saved workbook");
        Ok(())
    }

    /// Encode the workbook into .xlsx bytes
    pub fn export_to_buffer(&self) -> DocfillResult<Vec<u8>> {
        let mut xlsx = self.build()?;
        xlsx.save_to_buffer()
            .map_err(|e| DocfillError::Export(format!("Failed to encode Excel file: {}", e)))
    }

    fn build(&self) -> DocfillResult<XlsxWorkbook> {
        let mut xlsx = XlsxWorkbook::new();

        // An .xlsx needs at least one worksheet
        if self.workbook.sheets().is_empty() {
            xlsx.add_worksheet();
            return Ok(xlsx);
        }

        for sheet in self.workbook.sheets() {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name).map_err(|e| {
                DocfillError::Export(format!("Invalid sheet name '{}': {}", sheet.name, e))
            })?;
            export_sheet(sheet, worksheet)?;
        }

        Ok(xlsx)
    }
}

fn export_err(sheet: &Sheet, cell: impl std::fmt::Display, e: impl std::fmt::Display) -> DocfillError {
    DocfillError::Export(format!("Failed to write {}!{}: {}", sheet.name, cell, e))
}

fn column(sheet: &Sheet, col: u32) -> DocfillResult<u16> {
    u16::try_from(col).map_err(|_| export_err(sheet, col, "column out of range"))
}

fn export_sheet(sheet: &Sheet, worksheet: &mut Worksheet) -> DocfillResult<()> {
    let guard = MergedRegionGuard::new(sheet.merged_regions());

    for region in sheet.merged_regions() {
        if region.is_single_cell() {
            continue;
        }
        worksheet
            .merge_range(
                region.start.row,
                column(sheet, region.start.col)?,
                region.end.row,
                column(sheet, region.end.col)?,
                "",
                &Format::new(),
            )
            .map_err(|e| export_err(sheet, region, e))?;
    }

    for (coordinate, value) in sheet.cells() {
        // Content hidden under a merge is dropped
        if guard.is_suppressed(coordinate) {
            continue;
        }

        let row = coordinate.row;
        let col = column(sheet, coordinate.col)?;
        let result = match value {
            CellValue::Empty => continue,
            CellValue::Text(s) => worksheet.write_string(row, col, s).map(|_| ()),
            CellValue::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
            CellValue::Boolean(b) => worksheet.write_boolean(row, col, *b).map(|_| ()),
            CellValue::Formula(f) => worksheet
                .write_formula(row, col, Formula::new(format!("={}", f)))
                .map(|_| ()),
        };
        result.map_err(|e| export_err(sheet, coordinate, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellCoordinate, CellRange};
    use tempfile::TempDir;

    fn sample() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("Report");
        sheet.set_cell(CellCoordinate::new(0, 0), "Title".into());
        sheet.set_cell(CellCoordinate::new(1, 0), CellValue::Number(10.0));
        sheet.set_cell(CellCoordinate::new(2, 0), CellValue::Formula("A2*2".to_string()));
        sheet.set_cell(CellCoordinate::new(3, 0), CellValue::Boolean(true));
        sheet.add_merged_region(CellRange::parse("A1:C1").unwrap());
        workbook
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let output_path = dir.path().join("report.xlsx");

        ExcelExporter::new(&sample()).export(&output_path).unwrap();

        assert!(output_path.exists());
        assert!(std::fs::metadata(&output_path).unwrap().len() > 0);
    }

    #[test]
    fn test_export_empty_workbook() {
        let bytes = ExcelExporter::new(&Workbook::new()).export_to_buffer().unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_export_rejects_invalid_sheet_name() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("bad[name]");
        let err = ExcelExporter::new(&workbook).export_to_buffer().unwrap_err();
        assert!(matches!(err, DocfillError::Export(_)));
    }
}
