use crate::document::{CellValue, DocumentModel, Workbook};
use crate::error::{DocfillError, DocfillResult, FaultCode};
use crate::excel::{ExcelExporter, ExcelImporter, FsTemplateSource, DEFAULT_NAMESPACE};
use crate::parser;
use crate::path::PathEvaluator;
use crate::render::{self, dialect_of, MatrixOptions, MatrixTransformer, RenderedDocument};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Inputs of the render command
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub plan: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
    pub template_root: PathBuf,
    pub namespace: Option<String>,
    pub vars: Vec<String>,
    /// Write collected flat fields here as JSON
    pub fields_out: Option<PathBuf>,
    /// Treat render warnings as a failure
    pub strict: bool,
    pub verbose: bool,
}

/// Inputs of the matrix command
#[derive(Debug, Clone)]
pub struct MatrixArgs {
    pub data: PathBuf,
    pub source: String,
    pub options: MatrixOptions,
    pub values_only: bool,
    pub yaml: bool,
}

/// Output path for document `index` of `count`
pub fn output_path(output: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = output
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("xlsx");
    output.with_file_name(format!("{}_{}.{}", stem, index + 1, ext))
}

/// Execute the render command
pub fn render(args: RenderArgs) -> DocfillResult<()> {
    println!("{}", "📄 Docfill - Rendering templates".bold().green());
    println!("   Plan:      {}", args.plan.display());
    println!("   Data:      {}", args.data.display());
    println!("   Templates: {}\n", args.template_root.display());

    let mut plan = parser::load_plan(&args.plan)?;
    let data = parser::load_data(&args.data)?;

    // Command-line values win over plan values
    plan.variables.extend(parser::parse_variables(&args.vars)?);
    if let Some(namespace) = args.namespace {
        plan.namespace = Some(namespace);
    }

    if args.verbose {
        println!(
            "   {} section(s), {} matrix injection(s), namespace {}\n",
            plan.sections.len(),
            plan.matrices.len(),
            plan.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE).cyan()
        );
    }

    let source = FsTemplateSource::new(&args.template_root);
    let documents = render::render_plan(&plan, &data, &source)?;

    let mut warning_count = 0;
    let mut flat_fields = serde_json::Map::new();
    for (i, document) in documents.iter().enumerate() {
        let path = output_path(&args.output, i, documents.len());
        ExcelExporter::new(&document.workbook).export(&path)?;
        print_document(document, &path, args.verbose);

        for report in &document.reports {
            warning_count += report.warnings.len();
            for (name, value) in &report.flat_fields {
                flat_fields.insert(name.clone(), serde_json::Value::String(value.clone()));
            }
        }
    }

    if let Some(fields_out) = &args.fields_out {
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(flat_fields))?;
        std::fs::write(fields_out, json)?;
        println!("   Flat fields: {}", fields_out.display());
    }

    println!();
    if warning_count == 0 {
        println!("{}", "✅ Render complete".bold().green());
        return Ok(());
    }

    println!(
        "{}",
        format!("⚠️  Render complete with {} warning(s)", warning_count)
            .bold()
            .yellow()
    );
    if args.strict {
        return Err(DocfillError::Config(format!(
            "{} render warning(s) in strict mode",
            warning_count
        )));
    }
    Ok(())
}

fn print_document(document: &RenderedDocument, path: &Path, verbose: bool) {
    println!(
        "   📊 {} → {}",
        document.template_ref.bright_blue().bold(),
        path.display()
    );
    for report in &document.reports {
        println!(
            "      {} {} written, {} skipped, {} flat field(s)",
            report.section_id.cyan(),
            report.cells_written,
            report.cells_skipped,
            report.flat_fields.len()
        );
        for warning in &report.warnings {
            println!("      {} {}", "⚠️".yellow(), warning.to_string().yellow());
        }
        if verbose {
            for (name, value) in &report.flat_fields {
                println!("         {} = {}", name, value);
            }
        }
    }
}

/// Execute the matrix command: print a comparison matrix to stdout
pub fn matrix(args: MatrixArgs) -> DocfillResult<()> {
    let data = parser::load_data(&args.data)?;
    let evaluator = PathEvaluator::new(dialect_of(&args.source));
    let matrix = MatrixTransformer::new(args.options).build_from_tree(
        &data,
        &args.source,
        &evaluator,
        args.values_only,
    )?;

    let output = if args.yaml {
        serde_yaml::to_string(&matrix)?
    } else {
        serde_json::to_string_pretty(&matrix)?
    };
    println!("{}", output);
    Ok(())
}

/// Execute the inspect command: describe a template's layout
pub fn inspect(template: PathBuf, verbose: bool) -> DocfillResult<()> {
    println!("{}", "🔍 Docfill - Template Inspection".bold().green());
    println!("   File: {}\n", template.display());

    if !template.is_file() {
        return Err(DocfillError::template(
            FaultCode::TemplateNotFound,
            format!("Template '{}' not found", template.display()),
        ));
    }
    let workbook = ExcelImporter::new(&template).import()?;
    print_workbook(&workbook, verbose);
    Ok(())
}

fn print_workbook(workbook: &Workbook, verbose: bool) {
    for (id, sheet) in workbook.sheets().iter().enumerate() {
        let formulas: Vec<String> = sheet
            .cells()
            .filter(|(_, value)| value.is_formula())
            .map(|(coord, _)| coord.to_a1())
            .collect();
        let used_rows = workbook.last_row(id).map(|r| r + 1).unwrap_or(0);

        println!("   📊 Sheet: {}", sheet.name.bright_blue().bold());
        println!("      Used rows: {}", used_rows);
        println!("      Cells:     {}", sheet.cells().count());
        println!("      Merges:    {}", sheet.merged_regions().len());
        println!("      Formulas:  {}", formulas.len());

        if verbose {
            for region in sheet.merged_regions() {
                println!("         merge {}", region.to_string().cyan());
            }
            for (coord, value) in sheet.cells() {
                let text = match value {
                    CellValue::Formula(f) => format!("={}", f).bright_yellow().to_string(),
                    CellValue::Text(s) => s.clone(),
                    CellValue::Number(n) => n.to_string(),
                    CellValue::Boolean(b) => b.to_string(),
                    CellValue::Empty => continue,
                };
                println!("         {} {}", coord.to_a1().cyan(), text);
            }
        }
        println!();
    }
}
