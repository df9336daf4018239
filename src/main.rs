use anyhow::Context;
use clap::{Parser, Subcommand};
use royalbit_docfill::cli::{self, MatrixArgs, RenderArgs};
use royalbit_docfill::render::MatrixOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(about = "Fill XLSX templates from nested JSON/YAML data.")]
#[command(long_about = "Docfill - Template-driven spreadsheet filling

Maps nested data onto fixed-layout templates: single cells, ranges,
2D matrices and repeating row blocks. Formula cells and merged regions
in the template are never overwritten.

COMMANDS:
  render   - Render a plan (sections + mappings) into .xlsx output
  matrix   - Build a comparison matrix from a record list
  inspect  - Show sheets, merges and formula cells of a template

EXAMPLES:
  docfill render plan.yaml data.json -o out.xlsx -t ./templates
  docfill render plan.yaml data.json -o out.xlsx --var region=east
  docfill matrix data.json --source plans --row-spacing 1
  docfill inspect templates/report.xlsx --verbose

LOGGING:
  --verbose or RUST_LOG=royalbit_docfill=debug for per-mapping detail
  (written to stderr)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Render a plan into one or more .xlsx files.

The plan lists sections; each names a template and maps cell or range
references to path expressions over the data file.

  sections:
    - sectionId: summary
      templateRef: \"report-{region}.xlsx\"
      overwrite: true
      fieldMappings:
        B2: customer.name
        \"Detail!A4:C8\": comparisonMatrix

TEMPLATE LOOKUP:
  <template-root>/<namespace>/templates/<ref>, then <template-root>/<ref>

OUTPUT:
  Consecutive sections sharing a template write into one document.
  Several documents are saved as <output>_1.xlsx, <output>_2.xlsx, ...

Mapping problems (bad references, unknown sheets, truncated data) are
reported as warnings. Use --strict to fail on any warning.")]
    /// Render a plan against a data file
    Render {
        /// Plan file (YAML or JSON)
        plan: PathBuf,

        /// Data file (YAML or JSON)
        data: PathBuf,

        /// Output .xlsx path
        #[arg(short, long)]
        output: PathBuf,

        /// Directory holding templates
        #[arg(short, long, env = "DOCFILL_TEMPLATE_ROOT", default_value = ".")]
        template_root: PathBuf,

        /// Template namespace (overrides the plan)
        #[arg(short, long, env = "DOCFILL_NAMESPACE")]
        namespace: Option<String>,

        /// Template variable as key=value (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Write flat form fields to this JSON file
        #[arg(long)]
        fields_out: Option<PathBuf>,

        /// Fail when any mapping produced a warning
        #[arg(long)]
        strict: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Build a comparison matrix from a list of records.

Each record contributes one column (its label) and each distinct entry key
one row, in first-seen order. Keys match case-insensitively.

EXAMPLE DATA:
  plans:
    - planName: Basic
      benefits:
        - { name: Doctor Visits, value: $20 copay }
    - planName: Premium
      benefits:
        - { name: doctor visits, value: Covered }")]
    /// Print a comparison matrix as JSON or YAML
    Matrix {
        /// Data file (YAML or JSON)
        data: PathBuf,

        /// Path to the record list
        #[arg(short, long, default_value = "plans")]
        source: String,

        #[arg(long, default_value = "name")]
        key_field: String,

        #[arg(long, default_value = "value")]
        value_field: String,

        #[arg(long, default_value = "planName")]
        label_field: String,

        #[arg(long, default_value = "benefits")]
        entries_field: String,

        #[arg(long, default_value = "Benefit")]
        header_label: String,

        /// Empty columns before each record column
        #[arg(long, default_value = "1")]
        column_spacing: usize,

        /// Empty rows after each data row
        #[arg(long, default_value = "0")]
        row_spacing: usize,

        /// Drop the label column
        #[arg(long)]
        values_only: bool,

        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },

    /// Show the layout of a template
    Inspect {
        /// Template .xlsx file
        template: PathBuf,

        /// List merges and every non-empty cell
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "docfill=debug,royalbit_docfill=debug"
    } else {
        "docfill=info,royalbit_docfill=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            plan,
            data,
            output,
            template_root,
            namespace,
            vars,
            fields_out,
            strict,
            verbose,
        } => {
            init_tracing(verbose);
            cli::render(RenderArgs {
                plan: plan.clone(),
                data,
                output,
                template_root,
                namespace,
                vars,
                fields_out,
                strict,
                verbose,
            })
            .with_context(|| format!("render failed for plan {}", plan.display()))
        }

        Commands::Matrix {
            data,
            source,
            key_field,
            value_field,
            label_field,
            entries_field,
            header_label,
            column_spacing,
            row_spacing,
            values_only,
            yaml,
        } => {
            init_tracing(false);
            cli::matrix(MatrixArgs {
                data: data.clone(),
                source,
                options: MatrixOptions {
                    key_field,
                    value_field,
                    label_field,
                    entries_field,
                    header_label,
                    column_spacing,
                    row_spacing,
                },
                values_only,
                yaml,
            })
            .with_context(|| format!("matrix failed for {}", data.display()))
        }

        Commands::Inspect { template, verbose } => {
            init_tracing(verbose);
            cli::inspect(template.clone(), verbose)
                .with_context(|| format!("inspect failed for {}", template.display()))
        }
    }
}
