//! Docfill - map nested data onto fixed-layout spreadsheet templates
//!
//! Resolves path expressions against a JSON/YAML data tree and writes the
//! results into cells, ranges and repeating row blocks of an in-memory
//! workbook, leaving formula cells and merged regions intact.
//!
//! # Features
//!
//! - Dotted (`a.b[0].c`) and JSONPath (`$.a.b[*]`) expressions
//! - Range fills from scalars, flat lists and 2D matrices
//! - Repeating groups as table rows or numbered flat fields
//! - Comparison matrices from irregular record lists
//! - XLSX template import and export
//!
//! # Example
//!
//! ```no_run
//! use royalbit_docfill::document::Workbook;
//! use royalbit_docfill::render::render_into;
//! use royalbit_docfill::types::SectionDescriptor;
//! use serde_json::json;
//!
//! let mut workbook = Workbook::new();
//! workbook.add_sheet("Sheet1");
//!
//! let section = SectionDescriptor::new("summary", "report.xlsx")
//!     .with_overwrite(true)
//!     .with_mapping("B2", "customer.name")
//!     .with_mapping("A4:B5", "grid");
//! let data = json!({"customer": {"name": "Acme"}, "grid": [[1, "x"], [2, "y"]]});
//!
//! let report = render_into(&mut workbook, &section, &data)?;
//! println!("{} cells written", report.cells_written);
//! # Ok::<(), royalbit_docfill::error::DocfillError>(())
//! ```

pub mod cli;
pub mod document;
pub mod error;
pub mod excel;
pub mod parser;
pub mod path;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use error::{DocfillError, DocfillResult, FaultCode};
pub use render::{RenderReport, RenderWarning};
pub use types::{RenderPlan, SectionDescriptor};
