//! Excel persistence
//!
//! - Import: .xlsx template → `Workbook` (calamine)
//! - Export: `Workbook` → .xlsx (rust_xlsxwriter)
//! - Template lookup by namespace and reference

mod exporter;
mod importer;
pub mod template;

pub use exporter::ExcelExporter;
pub use importer::ExcelImporter;
pub use template::{
    resolve_reference, FsTemplateSource, MemoryTemplateSource, TemplateSource, DEFAULT_NAMESPACE,
};
