//! Render plan and data loading
//!
//! Plans and data trees are YAML or JSON; `.json` files are read as JSON,
//! everything else as YAML (which also accepts JSON).

use crate::error::{DocfillError, DocfillResult};
use crate::types::{RenderPlan, SectionDescriptor};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A plan file holds either a full plan or a bare section
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanFile {
    Plan(RenderPlan),
    Section(SectionDescriptor),
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Parse plan text; `json` selects the JSON parser
pub fn parse_plan(content: &str, json: bool) -> DocfillResult<RenderPlan> {
    let file: PlanFile = if json {
        serde_json::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };

    let mut plan = match file {
        PlanFile::Plan(plan) => plan,
        PlanFile::Section(section) => RenderPlan::single(section),
    };

    if plan.sections.is_empty() {
        return Err(DocfillError::Config("plan has no sections".to_string()));
    }

    // Unnamed sections get a positional id
    for (i, section) in plan.sections.iter_mut().enumerate() {
        if section.section_id.trim().is_empty() {
            section.section_id = format!("section-{}", i + 1);
        }
    }

    Ok(plan)
}

/// Load a render plan from a YAML or JSON file
pub fn load_plan(path: &Path) -> DocfillResult<RenderPlan> {
    let content = std::fs::read_to_string(path)?;
    parse_plan(&content, is_json(path))
}

/// Parse a data tree
pub fn parse_data(content: &str, json: bool) -> DocfillResult<Value> {
    if json {
        Ok(serde_json::from_str(content)?)
    } else {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Load a data tree from a YAML or JSON file
pub fn load_data(path: &Path) -> DocfillResult<Value> {
    let content = std::fs::read_to_string(path)?;
    parse_data(&content, is_json(path))
}

/// Parse repeated `key=value` arguments
pub fn parse_variables(pairs: &[String]) -> DocfillResult<IndexMap<String, String>> {
    let mut variables = IndexMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| DocfillError::Config(format!("expected key=value, got '{}'", pair)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(DocfillError::Config(format!("empty variable name in '{}'", pair)));
        }
        variables.insert(key.to_string(), value.to_string());
    }
    Ok(variables)
}
