//! Repeating group engine
//!
//! Expands one list of records either into consecutive table rows below an
//! anchor cell, or into a flat map of numbered field names such as
//! `child1_firstName`.

use super::range_fill::write_cell;
use super::RenderWarning;
use crate::document::reference::column_letters_to_index;
use crate::document::{CellAddress, CellCoordinate, DocumentModel, SheetId};
use crate::error::{DocfillError, DocfillResult, FaultCode};
use crate::path::PathEvaluator;
use crate::types::{IndexPosition, RepeatingGroupSpec};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// Result of a table-mode expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOutcome {
    pub rows: usize,
    pub cells_written: usize,
    pub cells_skipped: usize,
}

/// Parse a table column key: letters (`A`, `AB`) or a 1-based number
pub fn parse_column_key(key: &str) -> DocfillResult<u32> {
    let key = key.trim();
    let invalid = || DocfillError::InvalidColumnKey(key.to_string());

    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        return match key.parse::<u32>() {
            Ok(n) if n >= 1 && n - 1 <= crate::document::reference::MAX_COLUMN => Ok(n - 1),
            _ => Err(invalid()),
        };
    }
    column_letters_to_index(key).ok_or_else(invalid)
}

/// Flat field name for item `index` (already offset by `start_index`)
pub fn flat_field_name(spec: &RepeatingGroupSpec, index: i64, key: &str) -> String {
    let prefix = spec.prefix.as_deref().unwrap_or("");
    let suffix = spec.suffix.as_deref().unwrap_or("");
    let separator = spec.index_separator.as_deref().unwrap_or("");

    match spec.index_position {
        IndexPosition::BeforeField => format!("{prefix}{index}{separator}{key}{suffix}"),
        IndexPosition::AfterField => format!("{prefix}{key}{separator}{index}{suffix}"),
    }
}

/// Expands repeating groups with one path dialect
pub struct RepeatingGroupEngine<'w> {
    evaluator: PathEvaluator,
    warnings: &'w mut Vec<RenderWarning>,
}

impl<'w> RepeatingGroupEngine<'w> {
    pub fn new(evaluator: PathEvaluator, warnings: &'w mut Vec<RenderWarning>) -> Self {
        Self { evaluator, warnings }
    }

    /// Write one row per item starting at the anchor row.
    ///
    /// Column keys are absolute sheet columns. With `insert_rows` every row
    /// at or below the target is pushed down by one before the item lands.
    pub fn expand_table<D: DocumentModel + ?Sized>(
        &mut self,
        document: &mut D,
        default_sheet: SheetId,
        spec: &RepeatingGroupSpec,
        items: &[&Value],
    ) -> DocfillResult<TableOutcome> {
        let anchor_ref = spec.start_cell.as_deref().unwrap_or_default();
        let anchor = CellAddress::parse(anchor_ref)?;
        let sheet = match anchor.sheet.as_deref() {
            Some(name) => document.resolve_sheet(Some(name))?,
            None => default_sheet,
        };

        let mut columns: Vec<(u32, &str)> = Vec::with_capacity(spec.fields.len());
        for (key, path) in &spec.fields {
            match parse_column_key(key) {
                Ok(col) => columns.push((col, path.as_str())),
                Err(e) => self.warn(FaultCode::InvalidColumnKey, key, e.to_string()),
            }
        }

        let count = spec.item_count(items.len());
        let mut outcome = TableOutcome::default();

        for (i, item) in items.iter().take(count).enumerate() {
            let row = anchor.coordinate.row + i as u32;
            if row > crate::document::reference::MAX_ROW {
                self.warn(
                    FaultCode::DataTruncated,
                    anchor_ref,
                    format!("{} item(s) past the last sheet row dropped", count - i),
                );
                break;
            }

            if spec.insert_rows {
                document.shift_rows_down(sheet, row, 1);
            }

            for (col, path) in &columns {
                let value = match self.evaluator.evaluate(item, path) {
                    Ok(resolved) => resolved.to_value().unwrap_or(Value::Null),
                    Err(e) => {
                        self.warn(FaultCode::InvalidPath, path, e.to_string());
                        continue;
                    }
                };
                let coordinate = CellCoordinate::new(row, *col);
                if write_cell(document, sheet, coordinate, &value, spec.overwrite).is_written() {
                    outcome.cells_written += 1;
                } else {
                    outcome.cells_skipped += 1;
                }
            }
            outcome.rows += 1;
        }

        debug!(
            anchor = anchor_ref,
            rows = outcome.rows,
            written = outcome.cells_written,
            "Expanded repeating group table"
        );
        Ok(outcome)
    }

    /// Numbered flat fields for each item, in item then field order
    pub fn expand_flat(
        &mut self,
        spec: &RepeatingGroupSpec,
        items: &[&Value],
    ) -> IndexMap<String, String> {
        let mut fields = IndexMap::new();
        let count = spec.item_count(items.len());

        for (i, item) in items.iter().take(count).enumerate() {
            let index = spec.start_index + i as i64;
            for (key, path) in &spec.fields {
                let text = match self.evaluator.evaluate(item, path) {
                    Ok(resolved) => resolved.to_text(),
                    Err(e) => {
                        self.warn(FaultCode::InvalidPath, path, e.to_string());
                        continue;
                    }
                };
                fields.insert(flat_field_name(spec, index, key), text);
            }
        }

        debug!(items = count, fields = fields.len(), "Expanded numbered fields");
        fields
    }

    fn warn(&mut self, code: FaultCode, target: &str, message: String) {
        warn!(code = %code, location = target, "{}", message);
        self.warnings.push(RenderWarning::new(code, target, message));
    }
}
