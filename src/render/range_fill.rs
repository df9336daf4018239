//! Range fill engine
//!
//! Every write goes through [`write_cell`], which applies the same policy in
//! a fixed order: merged non-anchor cells are skipped, formula cells are
//! skipped, occupied cells are skipped unless overwriting, and only then is
//! the value coerced and written.

use crate::document::{CellCoordinate, CellRange, CellValue, DocumentModel, MergedRegionGuard, SheetId};
use serde_json::Value;

/// What happened to a single write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    MergedNonAnchor,
    Formula,
    Occupied,
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

/// Counters for one range fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    pub written: usize,
    /// Cells the write policy refused
    pub skipped: usize,
    /// Values that fell outside the range
    pub truncated: usize,
}

impl FillStats {
    fn record(&mut self, outcome: WriteOutcome) {
        if outcome.is_written() {
            self.written += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Convert a data value into cell content.
///
/// Strings that parse as finite decimals become numbers; everything else
/// keeps its text form. Null and the empty string clear the cell.
pub fn coerce(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Number(n) => match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Text(n.to_string()),
        },
        Value::String(s) if s.is_empty() => CellValue::Empty,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Number(f),
            _ => CellValue::Text(s.clone()),
        },
        Value::Bool(b) => CellValue::Text(b.to_string()),
        Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
    }
}

/// Write one value under the cell write policy
pub fn write_cell<D: DocumentModel + ?Sized>(
    document: &mut D,
    sheet: SheetId,
    coordinate: CellCoordinate,
    value: &Value,
    overwrite: bool,
) -> WriteOutcome {
    if MergedRegionGuard::new(document.merged_regions(sheet)).is_suppressed(coordinate) {
        return WriteOutcome::MergedNonAnchor;
    }

    match document.cell(sheet, coordinate) {
        Some(existing) if existing.is_formula() => return WriteOutcome::Formula,
        Some(existing) if !overwrite && !existing.is_empty() => return WriteOutcome::Occupied,
        _ => {}
    }

    document.set_cell(sheet, coordinate, coerce(value));
    WriteOutcome::Written
}

/// Fill `range` from `value`.
///
/// A sequence whose first element is itself a sequence fills row by row; any
/// other sequence flows across the range in row-major order and stops when
/// exhausted; a scalar lands on the range start only.
pub fn fill_range<D: DocumentModel + ?Sized>(
    document: &mut D,
    sheet: SheetId,
    range: &CellRange,
    value: &Value,
    overwrite: bool,
) -> FillStats {
    let mut stats = FillStats::default();
    let rows = range.rows() as usize;
    let cols = range.cols() as usize;

    let at = |r: usize, c: usize| {
        CellCoordinate::new(range.start.row + r as u32, range.start.col + c as u32)
    };

    match value {
        Value::Array(items) if matches!(items.first(), Some(Value::Array(_))) => {
            for (r, row) in items.iter().enumerate() {
                let cells: &[Value] = match row {
                    Value::Array(cells) => cells,
                    other => std::slice::from_ref(other),
                };
                if r >= rows {
                    stats.truncated += cells.len();
                    continue;
                }
                for (c, cell) in cells.iter().enumerate() {
                    if c >= cols {
                        stats.truncated += cells.len() - cols;
                        break;
                    }
                    stats.record(write_cell(document, sheet, at(r, c), cell, overwrite));
                }
            }
        }
        Value::Array(items) => {
            let capacity = rows * cols;
            for (i, item) in items.iter().enumerate() {
                if i >= capacity {
                    stats.truncated = items.len() - capacity;
                    break;
                }
                stats.record(write_cell(document, sheet, at(i / cols, i % cols), item, overwrite));
            }
        }
        scalar => {
            stats.record(write_cell(document, sheet, range.start, scalar, overwrite));
        }
    }

    stats
}
