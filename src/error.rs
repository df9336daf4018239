use std::fmt;
use thiserror::Error;

pub type DocfillResult<T> = Result<T, DocfillError>;

/// Machine-readable fault codes shared by errors and render warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    InvalidRange,
    InvalidCellReference,
    UnknownSheet,
    InvalidColumnKey,
    InvalidPath,
    BasePathNotSequence,
    MissingBasePath,
    DataTruncated,
    TemplateNotFound,
    UnresolvedPlaceholder,
    TemplateParseFailed,
    TemplateLoadFailed,
    ExportFailed,
    IoError,
    ConfigParseFailed,
}

/// How a fault should be surfaced to whoever invoked the render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCategory {
    NotFound,
    BadRequest,
    Internal,
}

impl FaultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCode::InvalidRange => "INVALID_RANGE",
            FaultCode::InvalidCellReference => "INVALID_CELL_REFERENCE",
            FaultCode::UnknownSheet => "UNKNOWN_SHEET",
            FaultCode::InvalidColumnKey => "INVALID_COLUMN_KEY",
            FaultCode::InvalidPath => "INVALID_PATH",
            FaultCode::BasePathNotSequence => "BASE_PATH_NOT_SEQUENCE",
            FaultCode::MissingBasePath => "MISSING_BASE_PATH",
            FaultCode::DataTruncated => "DATA_TRUNCATED",
            FaultCode::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            FaultCode::UnresolvedPlaceholder => "UNRESOLVED_PLACEHOLDER",
            FaultCode::TemplateParseFailed => "TEMPLATE_PARSE_FAILED",
            FaultCode::TemplateLoadFailed => "TEMPLATE_LOAD_FAILED",
            FaultCode::ExportFailed => "EXPORT_FAILED",
            FaultCode::IoError => "IO_ERROR",
            FaultCode::ConfigParseFailed => "CONFIG_PARSE_FAILED",
        }
    }

    pub fn category(&self) -> ResponseCategory {
        match self {
            FaultCode::TemplateNotFound => ResponseCategory::NotFound,
            FaultCode::UnresolvedPlaceholder
            | FaultCode::InvalidRange
            | FaultCode::InvalidCellReference
            | FaultCode::UnknownSheet
            | FaultCode::InvalidColumnKey
            | FaultCode::InvalidPath
            | FaultCode::BasePathNotSequence
            | FaultCode::MissingBasePath
            | FaultCode::DataTruncated
            | FaultCode::ConfigParseFailed => ResponseCategory::BadRequest,
            FaultCode::TemplateParseFailed
            | FaultCode::TemplateLoadFailed
            | FaultCode::ExportFailed
            | FaultCode::IoError => ResponseCategory::Internal,
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DocfillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cell reference '{reference}': {reason}")]
    CellReference { reference: String, reason: String },

    #[error("Invalid range '{0}', expected start:end")]
    InvalidRange(String),

    #[error("Sheet '{0}' not found in workbook")]
    UnknownSheet(String),

    #[error("Invalid column key '{0}'")]
    InvalidColumnKey(String),

    #[error("Invalid path expression '{expression}': {reason}")]
    PathSyntax { expression: String, reason: String },

    #[error("[{code}] {description}")]
    Template { code: FaultCode, description: String },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocfillError {
    pub fn template(code: FaultCode, description: impl Into<String>) -> Self {
        DocfillError::Template {
            code,
            description: description.into(),
        }
    }

    pub fn cell_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        DocfillError::CellReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> FaultCode {
        match self {
            DocfillError::Io(_) => FaultCode::IoError,
            DocfillError::Yaml(_) | DocfillError::Json(_) => FaultCode::ConfigParseFailed,
            DocfillError::CellReference { .. } => FaultCode::InvalidCellReference,
            DocfillError::InvalidRange(_) => FaultCode::InvalidRange,
            DocfillError::UnknownSheet(_) => FaultCode::UnknownSheet,
            DocfillError::InvalidColumnKey(_) => FaultCode::InvalidColumnKey,
            DocfillError::PathSyntax { .. } => FaultCode::InvalidPath,
            DocfillError::Template { code, .. } => *code,
            DocfillError::Export(_) => FaultCode::ExportFailed,
            DocfillError::Config(_) => FaultCode::ConfigParseFailed,
        }
    }
}
