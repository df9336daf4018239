//! Comparison matrix construction
//!
//! Normalizes irregular nested records (plans, each with a benefit list in
//! its own order) into a rectangular table: one header row of record labels,
//! then one row per distinct entry key in first-seen order.
//!
//! ```text
//! ["Benefit",       "", "Basic",     "", "Premium"     ]
//! ["Doctor Visits", "", "$20 copay", "", "Covered 100%"]
//! ["Prescriptions", "", "$10 copay", "", "$5 copay"    ]
//! ```

use crate::path::{scalar_text, PathEvaluator};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Rows of cell values, ready for a 2D range fill
pub type ComparisonMatrix = Vec<Vec<Value>>;

/// Field names and spacing used to build a matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatrixOptions {
    /// Entry field holding the row key
    pub key_field: String,
    /// Entry field holding the cell value
    pub value_field: String,
    /// Record field holding the column header
    pub label_field: String,
    /// Record field holding the entry list
    pub entries_field: String,
    /// Text of the top-left header cell
    pub header_label: String,
    /// Empty columns inserted before each record's column
    pub column_spacing: usize,
    /// Empty rows inserted after each data row
    pub row_spacing: usize,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            key_field: "name".to_string(),
            value_field: "value".to_string(),
            label_field: "planName".to_string(),
            entries_field: "benefits".to_string(),
            header_label: "Benefit".to_string(),
            column_spacing: 1,
            row_spacing: 0,
        }
    }
}

fn empty() -> Value {
    Value::String(String::new())
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Key text of an entry field; containers and null do not qualify
fn key_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(scalar_text(v)),
        _ => None,
    }
}

/// Builds comparison matrices from record lists
#[derive(Debug, Clone, Default)]
pub struct MatrixTransformer {
    options: MatrixOptions,
}

impl MatrixTransformer {
    pub fn new(options: MatrixOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatrixOptions {
        &self.options
    }

    /// Full matrix including the leading label column
    pub fn build_matrix(&self, records: &[Value]) -> ComparisonMatrix {
        let opts = &self.options;

        // Records without a label have no column to live in
        let labeled: Vec<(String, &Value)> = records
            .iter()
            .filter_map(|record| key_text(record.get(&opts.label_field)).map(|l| (l, record)))
            .collect();

        if labeled.is_empty() {
            return Vec::new();
        }

        // normalized key -> first-seen display form, in encounter order
        let mut keys: IndexMap<String, String> = IndexMap::new();
        let mut values_by_record: Vec<HashMap<String, Value>> = Vec::with_capacity(labeled.len());

        for (_, record) in &labeled {
            let mut values = HashMap::new();
            for entry in self.entries(record) {
                let Some(display) = key_text(entry.get(&opts.key_field)) else {
                    continue;
                };
                let normalized = normalize(&display);
                let value = match entry.get(&opts.value_field) {
                    None | Some(Value::Null) => empty(),
                    Some(value) => value.clone(),
                };
                values.insert(normalized.clone(), value);
                keys.entry(normalized).or_insert(display);
            }
            values_by_record.push(values);
        }

        let width = 1 + labeled.len() * (1 + opts.column_spacing);
        let mut matrix = Vec::with_capacity(1 + keys.len() * (1 + opts.row_spacing));

        let mut header = Vec::with_capacity(width);
        header.push(Value::String(opts.header_label.clone()));
        for (label, _) in &labeled {
            header.extend(std::iter::repeat_with(empty).take(opts.column_spacing));
            header.push(Value::String(label.clone()));
        }
        matrix.push(header);

        for (normalized, display) in &keys {
            let mut row = Vec::with_capacity(width);
            row.push(Value::String(display.clone()));
            for values in &values_by_record {
                row.extend(std::iter::repeat_with(empty).take(opts.column_spacing));
                row.push(values.get(normalized).cloned().unwrap_or_else(empty));
            }
            matrix.push(row);

            for _ in 0..opts.row_spacing {
                matrix.push(vec![empty(); width]);
            }
        }

        debug!(
            records = labeled.len(),
            keys = keys.len(),
            rows = matrix.len(),
            "Built comparison matrix"
        );
        matrix
    }

    /// Matrix without the label column, for templates that already carry row labels
    pub fn build_values_only(&self, records: &[Value]) -> ComparisonMatrix {
        self.build_matrix(records)
            .into_iter()
            .map(|row| row.into_iter().skip(1).collect())
            .collect()
    }

    /// Build from the record list found at `source` inside `data`
    pub fn build_from_tree(
        &self,
        data: &Value,
        source: &str,
        evaluator: &PathEvaluator,
        values_only: bool,
    ) -> crate::error::DocfillResult<ComparisonMatrix> {
        let records: Vec<Value> = evaluator
            .evaluate(data, source)?
            .items()
            .map(|items| items.into_iter().cloned().collect())
            .unwrap_or_default();

        Ok(if values_only {
            self.build_values_only(&records)
        } else {
            self.build_matrix(&records)
        })
    }

    fn entries<'a>(&self, record: &'a Value) -> &'a [Value] {
        record
            .get(&self.options.entries_field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Build a matrix with explicit key/value fields and spacing, other options default
pub fn build_matrix(
    records: &[Value],
    key_field: &str,
    value_field: &str,
    column_spacing: usize,
    row_spacing: usize,
) -> ComparisonMatrix {
    MatrixTransformer::new(MatrixOptions {
        key_field: key_field.to_string(),
        value_field: value_field.to_string(),
        column_spacing,
        row_spacing,
        ..Default::default()
    })
    .build_matrix(records)
}

/// Copy of `data` with `matrix` stored under the top-level `key`
pub fn inject_matrix(data: &Value, key: &str, matrix: ComparisonMatrix) -> Value {
    let rows = Value::Array(matrix.into_iter().map(Value::Array).collect());
    let mut result = match data {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    result.insert(key.to_string(), rows);
    Value::Object(result)
}
