//! Rendering pipeline
//!
//! - [`matrix`]: comparison matrices from irregular record lists
//! - [`range_fill`]: cell write policy and range fills
//! - [`repeating`]: table rows and numbered fields from record lists
//! - [`section`]: section rendering and the per-request session

pub mod matrix;
pub mod range_fill;
pub mod repeating;
pub mod section;

pub use matrix::{build_matrix, inject_matrix, ComparisonMatrix, MatrixOptions, MatrixTransformer};
pub use range_fill::{fill_range, write_cell, FillStats, WriteOutcome};
pub use repeating::RepeatingGroupEngine;
pub use section::{render_into, RenderSession, RenderedDocument};

use crate::error::{DocfillResult, FaultCode};
use crate::excel::TemplateSource;
use crate::path::{PathDialect, PathEvaluator};
use crate::types::RenderPlan;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// A per-mapping problem that did not stop the render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub code: FaultCode,
    /// Mapping target or expression the warning refers to
    pub target: String,
    pub message: String,
}

impl RenderWarning {
    pub fn new(code: FaultCode, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            target: target.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.target, self.message)
    }
}

/// Outcome of rendering one section
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub section_id: String,
    pub template_ref: String,
    pub cells_written: usize,
    pub cells_skipped: usize,
    /// Values for the flat form-field renderer, in mapping order
    pub flat_fields: IndexMap<String, String>,
    pub warnings: Vec<RenderWarning>,
}

impl RenderReport {
    pub fn new(section_id: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            ..Default::default()
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warning_codes(&self) -> Vec<FaultCode> {
        self.warnings.iter().map(|w| w.code).collect()
    }
}

/// Dialect implied by an expression's first character
pub fn dialect_of(expression: &str) -> PathDialect {
    if expression.trim_start().starts_with('$') {
        PathDialect::JsonPath
    } else {
        PathDialect::Dotted
    }
}

/// Copy of `data` with every configured matrix injected
pub fn prepare_data(plan: &RenderPlan, data: &Value) -> DocfillResult<Value> {
    let mut prepared = data.clone();
    for injection in &plan.matrices {
        let evaluator = PathEvaluator::new(dialect_of(&injection.source));
        let matrix = MatrixTransformer::new(injection.options.clone()).build_from_tree(
            &prepared,
            &injection.source,
            &evaluator,
            injection.values_only,
        )?;
        debug!(
            source = %injection.source,
            key = injection.target_key(),
            rows = matrix.len(),
            "Injecting comparison matrix"
        );
        prepared = inject_matrix(&prepared, injection.target_key(), matrix);
    }
    Ok(prepared)
}

/// Render every section of `plan` against `data`.
///
/// Per-mapping problems end up as report warnings; a fault that leaves no
/// usable document (template lookup, decoding, unknown section sheet) aborts.
pub fn render_plan(
    plan: &RenderPlan,
    data: &Value,
    source: &dyn TemplateSource,
) -> DocfillResult<Vec<RenderedDocument>> {
    let prepared = prepare_data(plan, data)?;
    let namespace = plan
        .namespace
        .clone()
        .unwrap_or_else(|| crate::excel::DEFAULT_NAMESPACE.to_string());

    let mut session = RenderSession::new(source, namespace).with_variables(plan.variables.clone());
    for section in &plan.sections {
        session.render_section(section, &prepared)?;
    }

    let documents = session.finish();
    info!(
        sections = plan.sections.len(),
        documents = documents.len(),
        "Render plan complete"
    );
    Ok(documents)
}
