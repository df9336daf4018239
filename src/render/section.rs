//! Section rendering
//!
//! [`render_into`] applies one section's mappings to a document it borrows
//! exclusively. [`RenderSession`] owns the documents of a multi-section
//! request and reuses the current one while consecutive sections name the
//! same template.

use super::range_fill::{fill_range, write_cell};
use super::repeating::RepeatingGroupEngine;
use super::{RenderReport, RenderWarning};
use crate::document::reference::is_range_reference;
use crate::document::{CellAddress, CellCoordinate, DocumentModel, RangeAddress, SheetId, Workbook};
use crate::error::{DocfillError, DocfillResult, FaultCode};
use crate::excel::template::resolve_reference;
use crate::excel::TemplateSource;
use crate::path::{PathEvaluator, Resolved};
use crate::types::{FieldMappingGroup, SectionDescriptor};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Whether a group field key addresses cells rather than naming a flat field
fn is_cell_target(target: &str) -> bool {
    if is_range_reference(target) {
        return true;
    }
    target.contains('!') || CellCoordinate::parse(target).is_ok()
}

struct SectionRenderer<'d, D: DocumentModel + ?Sized> {
    document: &'d mut D,
    default_sheet: SheetId,
    overwrite: bool,
    report: RenderReport,
}

impl<'d, D: DocumentModel + ?Sized> SectionRenderer<'d, D> {
    fn warn(&mut self, code: FaultCode, target: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(code = %code, location = target, "{}", message);
        self.report.warnings.push(RenderWarning::new(code, target, message));
    }

    fn warn_error(&mut self, target: &str, error: &DocfillError) {
        self.warn(error.code(), target, error.to_string());
    }

    fn sheet_for(&mut self, target: &str, sheet: Option<&str>) -> Option<SheetId> {
        match sheet {
            None => Some(self.default_sheet),
            Some(name) => match self.document.resolve_sheet(Some(name)) {
                Ok(id) => Some(id),
                Err(e) => {
                    self.warn_error(target, &e);
                    None
                }
            },
        }
    }

    /// Write a resolved value to a cell or range target
    fn write_target(&mut self, target: &str, value: &Value) {
        if is_range_reference(target) {
            let address = match RangeAddress::parse(target) {
                Ok(address) => address,
                Err(e) => return self.warn_error(target, &e),
            };
            let Some(sheet) = self.sheet_for(target, address.sheet.as_deref()) else {
                return;
            };

            let stats = fill_range(&mut *self.document, sheet, &address.range, value, self.overwrite);
            self.report.cells_written += stats.written;
            self.report.cells_skipped += stats.skipped;
            if stats.truncated > 0 {
                self.warn(
                    FaultCode::DataTruncated,
                    target,
                    format!("{} value(s) did not fit in {}", stats.truncated, address.range),
                );
            }
            debug!(location = target, written = stats.written, "Filled range");
        } else {
            let address = match CellAddress::parse(target) {
                Ok(address) => address,
                Err(e) => return self.warn_error(target, &e),
            };
            let Some(sheet) = self.sheet_for(target, address.sheet.as_deref()) else {
                return;
            };

            if write_cell(&mut *self.document, sheet, address.coordinate, value, self.overwrite).is_written() {
                self.report.cells_written += 1;
            } else {
                self.report.cells_skipped += 1;
            }
        }
    }

    /// Write a path result; a missing value leaves range targets untouched
    fn write_resolved(&mut self, target: &str, resolved: &Resolved<'_>) {
        if resolved.is_missing() && is_range_reference(target) {
            debug!(location = target, "No value for range; left as is");
            return;
        }
        let value = resolved.to_value().unwrap_or(Value::Null);
        self.write_target(target, &value);
    }

    fn map_fields(&mut self, data: &Value, evaluator: &PathEvaluator, fields: &IndexMap<String, String>) {
        for (target, expression) in fields {
            match evaluator.evaluate(data, expression) {
                Ok(resolved) => self.write_resolved(target, &resolved),
                Err(e) => self.warn_error(expression, &e),
            }
        }
    }

    fn render_group(&mut self, data: &Value, section_evaluator: &PathEvaluator, group: &FieldMappingGroup) {
        let evaluator = group
            .dialect
            .map(PathEvaluator::new)
            .unwrap_or(*section_evaluator);

        match &group.repeating_group {
            Some(spec) => {
                let Some(base_path) = group.base_path.as_deref() else {
                    return self.warn(
                        FaultCode::MissingBasePath,
                        "fieldMappingGroups",
                        "repeating group has no basePath",
                    );
                };
                let resolved = match evaluator.evaluate(data, base_path) {
                    Ok(resolved) => resolved,
                    Err(e) => return self.warn_error(base_path, &e),
                };
                let Some(items) = resolved.items() else {
                    return self.warn(
                        FaultCode::BasePathNotSequence,
                        base_path,
                        "basePath does not resolve to a sequence; group skipped",
                    );
                };

                let mut warnings = Vec::new();
                let mut engine = RepeatingGroupEngine::new(evaluator, &mut warnings);
                if spec.is_table() {
                    match engine.expand_table(&mut *self.document, self.default_sheet, spec, &items) {
                        Ok(outcome) => {
                            self.report.cells_written += outcome.cells_written;
                            self.report.cells_skipped += outcome.cells_skipped;
                        }
                        Err(e) => {
                            let anchor = spec.start_cell.clone().unwrap_or_default();
                            self.report.warnings.append(&mut warnings);
                            return self.warn_error(&anchor, &e);
                        }
                    }
                } else {
                    let fields = engine.expand_flat(spec, &items);
                    self.report.flat_fields.extend(fields);
                }
                self.report.warnings.append(&mut warnings);
            }
            None => {
                let base = match group.base_path.as_deref() {
                    None => Resolved::One(data),
                    Some(path) => match evaluator.evaluate(data, path) {
                        Ok(resolved) => resolved,
                        Err(e) => return self.warn_error(path, &e),
                    },
                };
                let base = base.to_value().unwrap_or(Value::Null);

                for (target, expression) in &group.fields {
                    let resolved = match evaluator.evaluate(&base, expression) {
                        Ok(resolved) => resolved,
                        Err(e) => {
                            self.warn_error(expression, &e);
                            continue;
                        }
                    };
                    if is_cell_target(target) {
                        self.write_resolved(target, &resolved);
                    } else {
                        // Later groups replace earlier values for the same name
                        self.report.flat_fields.insert(target.clone(), resolved.to_text());
                    }
                }
            }
        }
    }
}

/// Apply one section's mappings to `document`.
///
/// Only an unknown section-level sheet fails the call; every other problem
/// is recorded as a warning on the returned report.
pub fn render_into<D: DocumentModel + ?Sized>(
    document: &mut D,
    section: &SectionDescriptor,
    data: &Value,
) -> DocfillResult<RenderReport> {
    let default_sheet = document.resolve_sheet(section.sheet.as_deref())?;
    let evaluator = PathEvaluator::new(section.dialect);

    let mut report = RenderReport::new(section.section_id.clone());
    report.template_ref = section.template_ref.clone();

    let mut renderer = SectionRenderer {
        document,
        default_sheet,
        overwrite: section.overwrite,
        report,
    };

    renderer.map_fields(data, &evaluator, &section.field_mappings);
    for group in &section.field_mapping_groups {
        renderer.render_group(data, &evaluator, group);
    }

    let report = renderer.report;
    info!(
        section = %report.section_id,
        written = report.cells_written,
        skipped = report.cells_skipped,
        warnings = report.warnings.len(),
        "Rendered section"
    );
    Ok(report)
}

/// A finished or in-progress output document
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Template reference after placeholder substitution
    pub template_ref: String,
    pub workbook: Workbook,
    pub reports: Vec<RenderReport>,
}

/// State carried across the sections of one request
pub struct RenderSession<'s> {
    source: &'s dyn TemplateSource,
    namespace: String,
    variables: IndexMap<String, String>,
    current: Option<RenderedDocument>,
    finished: Vec<RenderedDocument>,
}

impl<'s> RenderSession<'s> {
    pub fn new(source: &'s dyn TemplateSource, namespace: impl Into<String>) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            variables: IndexMap::new(),
            current: None,
            finished: Vec::new(),
        }
    }

    pub fn with_variables(mut self, variables: IndexMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolved reference of the document currently being written
    pub fn current_template(&self) -> Option<&str> {
        self.current.as_ref().map(|doc| doc.template_ref.as_str())
    }

    /// Render a section, loading its template unless it is already current
    pub fn render_section(
        &mut self,
        section: &SectionDescriptor,
        data: &Value,
    ) -> DocfillResult<&RenderReport> {
        let reference = resolve_reference(&section.template_ref, &self.variables)?;

        if self.current_template() != Some(reference.as_str()) {
            let workbook = self.source.load(&self.namespace, &reference)?;
            debug!(template = %reference, "Loaded template");
            if let Some(previous) = self.current.take() {
                self.finished.push(previous);
            }
            self.current = Some(RenderedDocument {
                template_ref: reference.clone(),
                workbook,
                reports: Vec::new(),
            });
        } else {
            debug!(template = %reference, "Reusing current document");
        }

        let document = self
            .current
            .as_mut()
            .ok_or_else(|| DocfillError::template(FaultCode::TemplateLoadFailed, "no current document"))?;

        let mut report = render_into(&mut document.workbook, section, data)?;
        report.template_ref = reference;
        document.reports.push(report);

        document
            .reports
            .last()
            .ok_or_else(|| DocfillError::template(FaultCode::TemplateLoadFailed, "no report recorded"))
    }

    /// All documents in the order they were started
    pub fn finish(mut self) -> Vec<RenderedDocument> {
        if let Some(current) = self.current.take() {
            self.finished.push(current);
        }
        self.finished
    }
}
