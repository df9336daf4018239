//! Path expressions over the data tree
//!
//! The evaluator never fails on missing data: a key that is not there
//! resolves to [`Resolved::Missing`]. Only malformed expressions are errors.

mod tokenizer;

pub use tokenizer::Segment;

use crate::error::DocfillResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokenizer::Tokenizer;

/// Supported expression syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathDialect {
    /// `customer.children[0].name`, `plans.0.planName`, `items.*.price`
    #[default]
    #[serde(rename = "dotted", alias = "DIRECT", alias = "direct")]
    Dotted,
    /// `$.customer.children[0].name`, `$['plan name']`, `$.items[*].price`
    #[serde(rename = "jsonPath", alias = "JSONPATH", alias = "jsonpath")]
    JsonPath,
}

type ParseFn = fn(&str) -> DocfillResult<Vec<Segment>>;

fn parse_dotted(expression: &str) -> DocfillResult<Vec<Segment>> {
    Tokenizer::new(expression.trim()).dotted()
}

fn parse_json_path(expression: &str) -> DocfillResult<Vec<Segment>> {
    Tokenizer::new(expression.trim()).json_path()
}

impl PathDialect {
    fn parser(self) -> ParseFn {
        match self {
            PathDialect::Dotted => parse_dotted,
            PathDialect::JsonPath => parse_json_path,
        }
    }

    pub fn parse(self, expression: &str) -> DocfillResult<Vec<Segment>> {
        (self.parser())(expression)
    }
}

/// Result of evaluating a path expression
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    Missing,
    One(&'a Value),
    /// Produced by wildcard projection, in document order
    Many(Vec<&'a Value>),
}

impl<'a> Resolved<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }

    /// Single value, if the path selected exactly one node
    pub fn value(&self) -> Option<&'a Value> {
        match *self {
            Resolved::One(value) => Some(value),
            _ => None,
        }
    }

    /// Elements when the result is a sequence (a selected array or a projection)
    pub fn items(&self) -> Option<Vec<&'a Value>> {
        match *self {
            Resolved::One(Value::Array(items)) => Some(items.iter().collect()),
            Resolved::Many(ref items) => Some(items.clone()),
            _ => None,
        }
    }

    /// Owned JSON form; projections become arrays
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Resolved::Missing => None,
            Resolved::One(value) => Some((*value).clone()),
            Resolved::Many(items) => Some(Value::Array(
                items.iter().map(|value| (*value).clone()).collect(),
            )),
        }
    }

    /// Text used for flat field values
    pub fn to_text(&self) -> String {
        match self {
            Resolved::Missing => String::new(),
            Resolved::One(value) => scalar_text(value),
            Resolved::Many(_) => self
                .to_value()
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Display text of a scalar; null becomes empty, containers become JSON
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Evaluates expressions of one dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator {
    dialect: PathDialect,
}

impl PathEvaluator {
    pub fn new(dialect: PathDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> PathDialect {
        self.dialect
    }

    pub fn evaluate<'a>(&self, tree: &'a Value, expression: &str) -> DocfillResult<Resolved<'a>> {
        let segments = self.dialect.parse(expression)?;
        Ok(walk(tree, &segments))
    }
}

/// Evaluate with an explicit dialect
pub fn evaluate<'a>(
    tree: &'a Value,
    expression: &str,
    dialect: PathDialect,
) -> DocfillResult<Resolved<'a>> {
    PathEvaluator::new(dialect).evaluate(tree, expression)
}

fn walk<'a>(tree: &'a Value, segments: &[Segment]) -> Resolved<'a> {
    let mut current: Vec<&'a Value> = vec![tree];
    let mut projected = false;

    for segment in segments {
        current = match segment {
            Segment::Field(name) => current
                .into_iter()
                .filter_map(|value| field(value, name))
                .collect(),
            Segment::Index(index) => current
                .into_iter()
                .filter_map(|value| index_of(value, *index))
                .collect(),
            Segment::Wildcard => {
                projected = true;
                current.into_iter().flat_map(children).collect()
            }
        };

        if current.is_empty() && !projected {
            return Resolved::Missing;
        }
    }

    if projected {
        return Resolved::Many(current);
    }
    current
        .into_iter()
        .next()
        .map(Resolved::One)
        .unwrap_or(Resolved::Missing)
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(_) => name
            .parse::<i64>()
            .ok()
            .and_then(|index| index_of(value, index)),
        _ => None,
    }
}

fn index_of(value: &Value, index: i64) -> Option<&Value> {
    let items = value.as_array()?;
    let position = if index < 0 {
        items.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        index as usize
    };
    items.get(position)
}

fn children(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}
