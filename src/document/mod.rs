//! In-memory document model
//!
//! A `Workbook` is an already-decoded template: sheets of sparse cells plus
//! each sheet's merged regions. The render pipeline talks to it only through
//! the [`DocumentModel`] trait and owns it exclusively for the whole render.

mod merge;
pub mod reference;

pub use merge::MergedRegionGuard;
pub use reference::{CellAddress, CellCoordinate, CellRange, RangeAddress};

use crate::error::{DocfillError, DocfillResult};
use std::collections::BTreeMap;

/// Index of a sheet inside its workbook
pub type SheetId = usize;

/// Content of a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Formula text without the leading `=`; never overwritten by a render
    Formula(String),
}

/// Kind of a cell, as seen by the write policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Text,
    Number,
    Boolean,
    Formula,
}

impl CellValue {
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Empty,
            CellValue::Text(_) => CellKind::Text,
            CellValue::Number(_) => CellKind::Number,
            CellValue::Boolean(_) => CellKind::Boolean,
            CellValue::Formula(_) => CellKind::Formula,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// The document operations the render pipeline depends on
pub trait DocumentModel {
    /// Resolve a sheet by name; `None` means the first sheet
    fn resolve_sheet(&self, name: Option<&str>) -> DocfillResult<SheetId>;

    fn cell(&self, sheet: SheetId, coordinate: CellCoordinate) -> Option<&CellValue>;

    fn cell_kind(&self, sheet: SheetId, coordinate: CellCoordinate) -> CellKind {
        self.cell(sheet, coordinate)
            .map(CellValue::kind)
            .unwrap_or(CellKind::Empty)
    }

    fn merged_regions(&self, sheet: SheetId) -> &[CellRange];

    fn set_cell(&mut self, sheet: SheetId, coordinate: CellCoordinate, value: CellValue);

    /// Index of the last row holding at least one cell
    fn last_row(&self, sheet: SheetId) -> Option<u32>;

    /// Move every row at or below `from` down by `count`
    fn shift_rows_down(&mut self, sheet: SheetId, from: u32, count: u32);
}

/// A worksheet: sparse rows of cells plus merged regions
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    rows: BTreeMap<u32, BTreeMap<u32, CellValue>>,
    merged_regions: Vec<CellRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            merged_regions: Vec::new(),
        }
    }

    pub fn cell(&self, coordinate: CellCoordinate) -> Option<&CellValue> {
        self.rows
            .get(&coordinate.row)
            .and_then(|row| row.get(&coordinate.col))
    }

    /// Cell content, `Empty` when absent
    pub fn value_at(&self, reference: &str) -> CellValue {
        CellCoordinate::parse(reference)
            .ok()
            .and_then(|coord| self.cell(coord).cloned())
            .unwrap_or(CellValue::Empty)
    }

    pub fn set_cell(&mut self, coordinate: CellCoordinate, value: CellValue) {
        if value.is_empty() {
            if let Some(row) = self.rows.get_mut(&coordinate.row) {
                row.remove(&coordinate.col);
                if row.is_empty() {
                    self.rows.remove(&coordinate.row);
                }
            }
            return;
        }
        self.rows
            .entry(coordinate.row)
            .or_default()
            .insert(coordinate.col, value);
    }

    pub fn add_merged_region(&mut self, region: CellRange) {
        if !self.merged_regions.contains(&region) {
            self.merged_regions.push(region);
        }
    }

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// All non-empty cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellCoordinate, &CellValue)> {
        self.rows.iter().flat_map(|(row, cells)| {
            cells
                .iter()
                .map(move |(col, value)| (CellCoordinate::new(*row, *col), value))
        })
    }

    pub fn shift_rows_down(&mut self, from: u32, count: u32) {
        if count == 0 {
            return;
        }

        let moved: Vec<u32> = self.rows.range(from..).map(|(row, _)| *row).collect();
        for row in moved.into_iter().rev() {
            if let Some(cells) = self.rows.remove(&row) {
                match row.checked_add(count) {
                    Some(target) if target <= reference::MAX_ROW => {
                        self.rows.insert(target, cells);
                    }
                    _ => {}
                }
            }
        }

        for region in &mut self.merged_regions {
            if region.start.row >= from {
                region.start.row = region.start.row.saturating_add(count);
                region.end.row = region.end.row.saturating_add(count);
            } else if region.end.row >= from {
                region.end.row = region.end.row.saturating_add(count);
            }
        }
    }
}

/// An ordered collection of sheets
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self { sheets: Vec::new() }
    }

    /// Append a sheet and return it for population
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.get(id)
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> Option<&mut Sheet> {
        self.sheets.get_mut(id)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}

impl DocumentModel for Workbook {
    fn resolve_sheet(&self, name: Option<&str>) -> DocfillResult<SheetId> {
        match name {
            Some(name) => self
                .sheets
                .iter()
                .position(|sheet| sheet.name == name)
                .ok_or_else(|| DocfillError::UnknownSheet(name.to_string())),
            None if self.sheets.is_empty() => {
                Err(DocfillError::UnknownSheet("<first sheet>".to_string()))
            }
            None => Ok(0),
        }
    }

    fn cell(&self, sheet: SheetId, coordinate: CellCoordinate) -> Option<&CellValue> {
        self.sheets.get(sheet).and_then(|s| s.cell(coordinate))
    }

    fn merged_regions(&self, sheet: SheetId) -> &[CellRange] {
        self.sheets
            .get(sheet)
            .map(Sheet::merged_regions)
            .unwrap_or(&[])
    }

    fn set_cell(&mut self, sheet: SheetId, coordinate: CellCoordinate, value: CellValue) {
        if let Some(s) = self.sheets.get_mut(sheet) {
            s.set_cell(coordinate, value);
        }
    }

    fn last_row(&self, sheet: SheetId) -> Option<u32> {
        self.sheets.get(sheet).and_then(Sheet::last_row)
    }

    fn shift_rows_down(&mut self, sheet: SheetId, from: u32, count: u32) {
        if let Some(s) = self.sheets.get_mut(sheet) {
            s.shift_rows_down(from, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(reference: &str) -> CellCoordinate {
        CellCoordinate::parse(reference).unwrap()
    }

    #[test]
    fn test_resolve_sheet_defaults_to_first() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("Summary");
        workbook.add_sheet("Detail");

        assert_eq!(workbook.resolve_sheet(None).unwrap(), 0);
        assert_eq!(workbook.resolve_sheet(Some("Detail")).unwrap(), 1);
        assert!(matches!(
            workbook.resolve_sheet(Some("Nope")),
            Err(DocfillError::UnknownSheet(_))
        ));
    }

    #[test]
    fn test_empty_workbook_has_no_first_sheet() {
        let workbook = Workbook::new();
        assert!(workbook.resolve_sheet(None).is_err());
    }

    #[test]
    fn test_set_and_clear_cell() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(coord("B2"), CellValue::Number(4.0));
        assert_eq!(sheet.value_at("B2"), CellValue::Number(4.0));
        assert_eq!(sheet.last_row(), Some(1));

        sheet.set_cell(coord("B2"), CellValue::Empty);
        assert_eq!(sheet.value_at("B2"), CellValue::Empty);
        assert_eq!(sheet.last_row(), None);
    }

    #[test]
    fn test_cell_kind() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet("S");
        sheet.set_cell(coord("A1"), CellValue::Formula("SUM(B1:B3)".to_string()));
        sheet.set_cell(coord("A2"), "label".into());

        assert_eq!(workbook.cell_kind(0, coord("A1")), CellKind::Formula);
        assert_eq!(workbook.cell_kind(0, coord("A2")), CellKind::Text);
        assert_eq!(workbook.cell_kind(0, coord("A3")), CellKind::Empty);
    }

    #[test]
    fn test_shift_rows_down_moves_cells_and_merges() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(coord("A1"), "header".into());
        sheet.set_cell(coord("A2"), "row2".into());
        sheet.set_cell(coord("A3"), "row3".into());
        sheet.add_merged_region(CellRange::parse("B3:C3").unwrap());
        sheet.add_merged_region(CellRange::parse("D1:D2").unwrap());

        sheet.shift_rows_down(1, 2);

        assert_eq!(sheet.value_at("A1"), CellValue::Text("header".to_string()));
        assert_eq!(sheet.value_at("A2"), CellValue::Empty);
        assert_eq!(sheet.value_at("A4"), CellValue::Text("row2".to_string()));
        assert_eq!(sheet.value_at("A5"), CellValue::Text("row3".to_string()));
        assert_eq!(
            sheet.merged_regions(),
            &[
                CellRange::parse("B5:C5").unwrap(),
                CellRange::parse("D1:D4").unwrap()
            ]
        );
    }

    #[test]
    fn test_cells_iterate_row_major() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(coord("B2"), 2.0.into());
        sheet.set_cell(coord("A2"), 1.0.into());
        sheet.set_cell(coord("C1"), 0.0.into());

        let order: Vec<String> = sheet.cells().map(|(c, _)| c.to_a1()).collect();
        assert_eq!(order, vec!["C1", "A2", "B2"]);
    }
}
