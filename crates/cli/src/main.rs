mod render;

use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use chartcfg_catalog::Catalog;
use chartcfg_core::Validator;
use chartcfg_diagnostics::{self as diag, Diagnostic};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_json, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "chartcfg",
    version,
    about = "Validate chart widget configuration files"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Setting catalog (JSONC) to use instead of the embedded one.
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Log debug events to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Validate a configuration file. Use `-` to read stdin.
    #[command(visible_alias = "check")]
    Lint { file: String },

    /// Print the section tree of a configuration file as JSON.
    Tree { file: String },

    /// Print a configuration file with comments blanked out.
    StripComments { file: String },

    /// Explain a diagnostic ID (e.g. CC3002).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Lint { file } => cmd_lint(&file, cli.catalog.as_deref(), format)?,
        Cmd::Tree { file } => cmd_tree(&file, cli.catalog.as_deref())?,
        Cmd::StripComments { file } => cmd_strip_comments(&file)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_lint(file: &str, catalog_path: Option<&str>, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let catalog = load_catalog(catalog_path)?;
    let vr = chartcfg_core::validate(&input, &catalog);

    match format {
        Format::Json => print_json(&vr)?,
        Format::Pretty => {
            render_diagnostics_pretty(&input, display_name(file), &vr.issues);
            print_summary(&vr.issues);
            if vr.ok {
                eprintln!("lint ok");
            }
        }
    }

    exit_on_errors(&vr.issues);
    Ok(())
}

fn cmd_tree(file: &str, catalog_path: Option<&str>) -> Result<()> {
    let input = read_input(file)?;
    let catalog = load_catalog(catalog_path)?;
    let mut validator = Validator::new(&catalog);
    let issues = validator.validate(&input);
    tracing::debug!(issues = issues.len(), "tree built");
    // the tree is JSON in either output mode
    print_json(validator.tree())
}

fn cmd_strip_comments(file: &str) -> Result<()> {
    let input = read_input(file)?;
    print!("{}", chartcfg_core::delete_comments(&input));
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
                "severity": diag::severity_for_code(id),
            });
            print_json(&out)?;
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Read a file, or stdin when `file` is `-`.
fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))
}

fn display_name(file: &str) -> &str {
    if file == "-" { "<stdin>" } else { file }
}

/// `--catalog` path if given, else the catalog embedded in the binary.
fn load_catalog(explicit_path: Option<&str>) -> Result<Catalog> {
    match explicit_path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog '{path}'"))?;
            Catalog::from_jsonc(&source).with_context(|| format!("invalid catalog '{path}'"))
        }
        None => Catalog::builtin().context("embedded catalog is invalid"),
    }
}

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(Diagnostic::is_error) {
        process::exit(1);
    }
}
