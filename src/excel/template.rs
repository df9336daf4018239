//! Template lookup
//!
//! References may carry `{var}` placeholders that are filled from request
//! variables before lookup. A filesystem source searches
//! `<root>/<namespace>/templates/<ref>` and then `<root>/<ref>`.

use super::ExcelImporter;
use crate::document::Workbook;
use crate::error::{DocfillError, DocfillResult, FaultCode};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Namespace used when a request does not name one
pub const DEFAULT_NAMESPACE: &str = "common-templates";

/// Supplies decoded templates by resolved reference
pub trait TemplateSource {
    fn load(&self, namespace: &str, reference: &str) -> DocfillResult<Workbook>;
}

/// Substitute `{name}` placeholders; any placeholder left without a value is an error
pub fn resolve_reference(reference: &str, variables: &IndexMap<String, String>) -> DocfillResult<String> {
    let placeholder = Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").map_err(|e| {
        DocfillError::template(FaultCode::TemplateLoadFailed, format!("Invalid placeholder pattern: {}", e))
    })?;

    let mut missing = Vec::new();
    let resolved = placeholder.replace_all(reference, |caps: &Captures| {
        let name = &caps[1];
        match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing.is_empty() {
        return Err(DocfillError::template(
            FaultCode::UnresolvedPlaceholder,
            format!(
                "Template reference '{}' has unresolved placeholder(s): {}",
                reference,
                missing.join(", ")
            ),
        ));
    }
    Ok(resolved.into_owned())
}

/// Templates stored under a directory tree
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths tried for `reference`, in lookup order
    pub fn candidates(&self, namespace: &str, reference: &str) -> Vec<PathBuf> {
        let relative = Path::new(reference);
        if relative.is_absolute() {
            return vec![relative.to_path_buf()];
        }
        vec![
            self.root.join(namespace).join("templates").join(relative),
            self.root.join(relative),
        ]
    }

    /// First existing candidate path
    pub fn locate(&self, namespace: &str, reference: &str) -> DocfillResult<PathBuf> {
        let candidates = self.candidates(namespace, reference);
        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| {
                let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
                DocfillError::template(
                    FaultCode::TemplateNotFound,
                    format!("Template '{}' not found (tried {})", reference, tried.join(", ")),
                )
            })
    }
}

impl TemplateSource for FsTemplateSource {
    fn load(&self, namespace: &str, reference: &str) -> DocfillResult<Workbook> {
        let path = self.locate(namespace, reference)?;
        debug!(path = %path.display(), "Loading template");
        ExcelImporter::new(&path).import()
    }
}

/// Templates held in memory, keyed by reference
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    templates: IndexMap<String, Workbook>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, workbook: Workbook) {
        self.templates.insert(reference.into(), workbook);
    }
}

impl TemplateSource for MemoryTemplateSource {
    fn load(&self, _namespace: &str, reference: &str) -> DocfillResult<Workbook> {
        self.templates.get(reference).cloned().ok_or_else(|| {
            DocfillError::template(
                FaultCode::TemplateNotFound,
                format!("Template '{}' not found", reference),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResponseCategory;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_reference_substitutes() {
        let resolved =
            resolve_reference("{state}/quote-{product}.xlsx", &vars(&[("state", "CA"), ("product", "dental")]))
                .unwrap();
        assert_eq!(resolved, "CA/quote-dental.xlsx");
        assert_eq!(resolve_reference("plain.xlsx", &IndexMap::new()).unwrap(), "plain.xlsx");
    }

    #[test]
    fn test_resolve_reference_reports_missing() {
        let err = resolve_reference("{state}/{product}.xlsx", &vars(&[("state", "CA")])).unwrap_err();
        assert_eq!(err.code(), FaultCode::UnresolvedPlaceholder);
        assert_eq!(err.code().category(), ResponseCategory::BadRequest);
        assert!(err.to_string().contains("product"));
    }

    #[test]
    fn test_candidates_order() {
        let source = FsTemplateSource::new("/templates");
        assert_eq!(
            source.candidates("tenant", "a.xlsx"),
            vec![
                PathBuf::from("/templates/tenant/templates/a.xlsx"),
                PathBuf::from("/templates/a.xlsx"),
            ]
        );
    }

    #[test]
    fn test_locate_prefers_namespace() {
        let dir = TempDir::new().unwrap();
        let namespaced = dir.path().join("tenant").join("templates");
        std::fs::create_dir_all(&namespaced).unwrap();
        std::fs::write(namespaced.join("a.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("a.xlsx"), b"x").unwrap();
        std::fs::write(dir.path().join("b.xlsx"), b"x").unwrap();

        let source = FsTemplateSource::new(dir.path());
        assert_eq!(source.locate("tenant", "a.xlsx").unwrap(), namespaced.join("a.xlsx"));
        assert_eq!(source.locate("tenant", "b.xlsx").unwrap(), dir.path().join("b.xlsx"));
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = FsTemplateSource::new(dir.path())
            .load(DEFAULT_NAMESPACE, "nope.xlsx")
            .unwrap_err();
        assert_eq!(err.code(), FaultCode::TemplateNotFound);
        assert_eq!(err.code().category(), ResponseCategory::NotFound);
    }

    #[test]
    fn test_undecodable_template_is_parse_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.xlsx"), b"not a workbook").unwrap();
        let err = FsTemplateSource::new(dir.path())
            .load(DEFAULT_NAMESPACE, "broken.xlsx")
            .unwrap_err();
        assert_eq!(err.code(), FaultCode::TemplateParseFailed);
        assert_eq!(err.code().category(), ResponseCategory::Internal);
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemoryTemplateSource::new();
        source.insert("a.xlsx", Workbook::new());
        assert!(source.load("any", "a.xlsx").is_ok());
        assert_eq!(
            source.load("any", "b.xlsx").unwrap_err().code(),
            FaultCode::TemplateNotFound
        );
    }
}
