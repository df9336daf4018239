//! Excel importer - .xlsx template → in-memory `Workbook`
//!
//! Reads cell values, formulas and merged regions. Formula cells keep their
//! formula text so the render never overwrites them.

use crate::document::{CellCoordinate, CellRange, CellValue, Sheet, Workbook};
use crate::error::{DocfillError, DocfillResult, FaultCode};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decodes .xlsx templates into the document model
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import the file at this importer's path
    pub fn import(&self) -> DocfillResult<Workbook> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            DocfillError::template(
                FaultCode::TemplateParseFailed,
                format!("Failed to open Excel file {}: {}", self.path.display(), e),
            )
        })?;
        read_workbook(&mut workbook)
    }

    /// Import an .xlsx held in memory
    pub fn import_bytes(bytes: Vec<u8>) -> DocfillResult<Workbook> {
        let mut workbook = Xlsx::new(Cursor::new(bytes)).map_err(|e| {
            DocfillError::template(
                FaultCode::TemplateParseFailed,
                format!("Failed to decode Excel data: {}", e),
            )
        })?;
        read_workbook(&mut workbook)
    }
}

fn parse_failed(sheet: &str, e: impl std::fmt::Display) -> DocfillError {
    DocfillError::template(
        FaultCode::TemplateParseFailed,
        format!("Failed to read sheet '{}': {}", sheet, e),
    )
}

fn read_workbook<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> DocfillResult<Workbook> {
    workbook
        .load_merged_regions()
        .map_err(|e| parse_failed("<merged regions>", e))?;

    let mut result = Workbook::new();
    for name in workbook.sheet_names() {
        let mut sheet = Sheet::new(name.clone());

        let values = workbook
            .worksheet_range(&name)
            .map_err(|e| parse_failed(&name, e))?;
        read_values(&values, &mut sheet);

        // Formula cells win over their cached values
        if let Ok(formulas) = workbook.worksheet_formula(&name) {
            read_formulas(&formulas, &mut sheet);
        }

        for (_, _, dimensions) in workbook.merged_regions_by_sheet(&name) {
            let start = CellCoordinate::new(dimensions.start.0, dimensions.start.1);
            let end = CellCoordinate::new(dimensions.end.0, dimensions.end.1);
            if let Ok(region) = CellRange::new(start, end) {
                sheet.add_merged_region(region);
            }
        }

        debug!(
            sheet = %name,
            cells = sheet.cells().count(),
            merges = sheet.merged_regions().len(),
            "Imported sheet"
        );
        result.push_sheet(sheet);
    }

    Ok(result)
}

fn read_values(range: &Range<Data>, sheet: &mut Sheet) {
    let Some((row0, col0)) = range.start() else {
        return;
    };

    for (row, col, data) in range.used_cells() {
        let value = match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) if s.is_empty() => continue,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(d) => CellValue::Number(d.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
            Data::Empty => continue,
        };
        sheet.set_cell(
            CellCoordinate::new(row0 + row as u32, col0 + col as u32),
            value,
        );
    }
}

fn read_formulas(range: &Range<String>, sheet: &mut Sheet) {
    let Some((row0, col0)) = range.start() else {
        return;
    };

    for (row, col, formula) in range.used_cells() {
        let formula = formula.trim().trim_start_matches('=');
        if formula.is_empty() {
            continue;
        }
        sheet.set_cell(
            CellCoordinate::new(row0 + row as u32, col0 + col as u32),
            CellValue::Formula(formula.to_string()),
        );
    }
}
