use crate::path::PathDialect;
use crate::render::matrix::MatrixOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

//==============================================================================
// Section descriptors
//==============================================================================

/// One section of a render: a template plus the mappings written into it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    #[serde(default)]
    pub section_id: String,

    /// Template reference; may contain `{var}` placeholders
    #[serde(alias = "templatePath")]
    pub template_ref: String,

    /// Sheet used by references without a `Sheet!` prefix (first sheet if absent)
    #[serde(default)]
    pub sheet: Option<String>,

    /// Whether range fills may replace non-empty cells
    #[serde(default)]
    pub overwrite: bool,

    #[serde(default, alias = "mappingType")]
    pub dialect: PathDialect,

    /// Cell or range reference → path expression
    #[serde(default)]
    pub field_mappings: IndexMap<String, String>,

    #[serde(default)]
    pub field_mapping_groups: Vec<FieldMappingGroup>,
}

impl SectionDescriptor {
    pub fn new(section_id: impl Into<String>, template_ref: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            template_ref: template_ref.into(),
            ..Default::default()
        }
    }

    pub fn with_mapping(mut self, target: impl Into<String>, expression: impl Into<String>) -> Self {
        self.field_mappings.insert(target.into(), expression.into());
        self
    }

    pub fn with_group(mut self, group: FieldMappingGroup) -> Self {
        self.field_mapping_groups.push(group);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// A block of mappings sharing a dialect and, optionally, a base path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingGroup {
    #[serde(default)]
    pub base_path: Option<String>,

    /// Overrides the section dialect
    #[serde(default, alias = "mappingType")]
    pub dialect: Option<PathDialect>,

    /// Target → path; relative to `base_path` when one is set
    #[serde(default, alias = "columnMap")]
    pub fields: IndexMap<String, String>,

    #[serde(default)]
    pub repeating_group: Option<RepeatingGroupSpec>,
}

impl FieldMappingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_field(mut self, target: impl Into<String>, expression: impl Into<String>) -> Self {
        self.fields.insert(target.into(), expression.into());
        self
    }

    pub fn with_repeating_group(mut self, spec: RepeatingGroupSpec) -> Self {
        self.repeating_group = Some(spec);
        self
    }
}

/// Where the item index goes in a synthesized flat field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexPosition {
    /// `prefix + index + separator + field + suffix`
    #[default]
    #[serde(rename = "BEFORE_FIELD", alias = "before")]
    BeforeField,
    /// `prefix + field + separator + index + suffix`
    #[serde(rename = "AFTER_FIELD", alias = "after")]
    AfterField,
}

fn default_start_index() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

/// Expansion of one list of records into table rows or numbered fields.
///
/// `start_cell` selects table mode; without it the group expands into flat
/// field names built from `prefix`, the index and each `fields` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatingGroupSpec {
    #[serde(default, alias = "anchorCell")]
    pub start_cell: Option<String>,

    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub suffix: Option<String>,

    #[serde(default = "default_start_index")]
    pub start_index: i64,

    #[serde(default)]
    pub index_separator: Option<String>,

    #[serde(default)]
    pub index_position: IndexPosition,

    #[serde(default)]
    pub max_items: Option<usize>,

    #[serde(default)]
    pub insert_rows: bool,

    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Column key (table mode) or field key (flat mode) → path within an item
    #[serde(default, alias = "columnMap")]
    pub fields: IndexMap<String, String>,
}

impl Default for RepeatingGroupSpec {
    fn default() -> Self {
        Self {
            start_cell: None,
            prefix: None,
            suffix: None,
            start_index: default_start_index(),
            index_separator: None,
            index_position: IndexPosition::default(),
            max_items: None,
            insert_rows: false,
            overwrite: true,
            fields: IndexMap::new(),
        }
    }
}

impl RepeatingGroupSpec {
    /// Table mode anchored at `start_cell`
    pub fn table(start_cell: impl Into<String>) -> Self {
        Self {
            start_cell: Some(start_cell.into()),
            ..Default::default()
        }
    }

    /// Numbered flat-field mode
    pub fn numbered(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.fields.insert(key.into(), expression.into());
        self
    }

    pub fn is_table(&self) -> bool {
        self.start_cell
            .as_deref()
            .map(|cell| !cell.trim().is_empty())
            .unwrap_or(false)
    }

    /// Number of items to expand out of `available`
    pub fn item_count(&self, available: usize) -> usize {
        self.max_items
            .map(|max| max.min(available))
            .unwrap_or(available)
    }
}

//==============================================================================
// Render plans
//==============================================================================

/// Derived comparison matrix injected into the data tree before rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixInjection {
    /// Path to the list of records
    pub source: String,

    /// Top-level key receiving the matrix
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub values_only: bool,

    #[serde(flatten)]
    pub options: MatrixOptions,
}

impl MatrixInjection {
    pub fn target_key(&self) -> &str {
        match &self.target {
            Some(target) => target,
            None if self.values_only => "comparisonMatrixValues",
            None => "comparisonMatrix",
        }
    }
}

/// A full render request: sections rendered in order into one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    #[serde(default)]
    pub namespace: Option<String>,

    /// Template resolution variables (not document data)
    #[serde(default)]
    pub variables: IndexMap<String, String>,

    #[serde(default)]
    pub matrices: Vec<MatrixInjection>,

    pub sections: Vec<SectionDescriptor>,
}

impl RenderPlan {
    pub fn single(section: SectionDescriptor) -> Self {
        Self {
            sections: vec![section],
            ..Default::default()
        }
    }
}
