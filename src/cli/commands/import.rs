//! `stagecraft import` command - create events from CSV rows
//!
//! Every row runs through the same wizard as `event new --no-input`, so a
//! row is stored only if each step accepts it.

use console::style;
use csv::ReaderBuilder;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::cli::helpers::{describe_wizard_error, open_project};
use crate::cli::GlobalOpts;
use crate::core::form::FormData;
use crate::core::store::{MemoryStore, Persistence, ProjectStore};
use crate::core::Config;
use crate::schema::definition::LoadedWizard;
use crate::schema::wizard::FieldKind;

/// Separator for list cells (artists, partners, selection reasons)
const LIST_SEPARATOR: char = ';';

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: Option<PathBuf>,

    /// Print a CSV header row for the wizard's fields
    #[arg(long)]
    pub template: bool,

    /// Validate CSV without creating files
    #[arg(long)]
    pub dry_run: bool,

    /// Continue importing after errors (default: stop on first error)
    #[arg(long)]
    pub skip_errors: bool,

    /// Wizard definition each row must satisfy
    #[arg(long, short = 'w')]
    pub wizard: Option<String>,
}

#[derive(Default)]
struct ImportStats {
    rows_processed: usize,
    events_created: usize,
    errors: usize,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_for(Some(&project));
    let wizard = LoadedWizard::load(
        args.wizard.as_deref().unwrap_or(config.wizard()),
        Some(&project),
    )?;

    if args.template {
        return generate_template(&wizard);
    }

    let file_path = args.file.clone().ok_or_else(|| {
        miette::miette!(
            help = "print a header row with 'stagecraft import --template'",
            "CSV file required. Usage: stagecraft import events.csv"
        )
    })?;
    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }

    println!(
        "{} Importing events from {}{}",
        style("→").blue(),
        style(file_path.display()).yellow(),
        if args.dry_run {
            style(" (dry run)").dim().to_string()
        } else {
            String::new()
        }
    );
    println!();

    let mut memory = MemoryStore::new();
    let mut project_store = ProjectStore::new(&project, config.author());
    let store: &mut dyn Persistence = if args.dry_run {
        &mut memory
    } else {
        &mut project_store
    };

    let stats = import_rows(&wizard, &file_path, &args, store)?;

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed: {}", style(stats.rows_processed).cyan());
    println!("  Events created: {}", style(stats.events_created).green());
    if stats.errors > 0 {
        println!("  Errors:         {}", style(stats.errors).red());
    }

    if args.dry_run {
        println!();
        println!("{}", style("Dry run complete. No files were created.").yellow());
    }

    if stats.errors > 0 && !args.skip_errors {
        return Err(miette::miette!("Import completed with {} error(s)", stats.errors));
    }

    Ok(())
}

fn import_rows(
    wizard: &LoadedWizard,
    file_path: &PathBuf,
    args: &ImportArgs,
    store: &mut dyn Persistence,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    let file = File::open(file_path).into_diagnostic()?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);
    warn_unknown_columns(wizard, &header_map);

    for (row_idx, result) in rdr.records().enumerate() {
        let row_num = row_idx + 2; // +2 for 1-indexed and header row
        stats.rows_processed += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{} Row {}: CSV parse error: {}", style("✗").red(), row_num, e);
                stats.errors += 1;
                if !args.skip_errors {
                    return Err(miette::miette!("CSV parse error at row {}: {}", row_num, e));
                }
                continue;
            }
        };

        let form = row_to_form(wizard, &record, &header_map);
        let title = form.get_str("title").unwrap_or("(untitled)").to_string();

        let mut controller = wizard.controller()?.with_form(form);
        let outcome = match controller.advance_to_end() {
            Ok(_) => controller.submit(store),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(id) => {
                stats.events_created += 1;
                let verb = if args.dry_run { "Would create" } else { "Created" };
                println!(
                    "{} Row {}: {} {} - {}",
                    style("✓").green(),
                    row_num,
                    verb,
                    style(&id).cyan(),
                    title
                );
            }
            Err(e) => {
                let report = describe_wizard_error(&controller, e);
                eprintln!("{} Row {}: {}", style("✗").red(), row_num, report);
                stats.errors += 1;
                if !args.skip_errors {
                    return Err(miette::miette!("Import stopped at row {}", row_num));
                }
            }
        }
    }

    Ok(stats)
}

/// Wizard defaults overlaid with the row's non-empty cells
///
/// Cells are converted by the field's schema type. A row that leaves
/// `confirmed` empty counts as confirmed.
fn row_to_form(
    wizard: &LoadedWizard,
    record: &csv::StringRecord,
    header_map: &HashMap<String, usize>,
) -> FormData {
    let mut form = wizard.defaults();
    form.set("confirmed", true);

    for (field, &idx) in header_map {
        let Some(cell) = record.get(idx) else {
            continue;
        };
        let kind = FieldKind::from_schema(wizard.property(field));
        if let Some(value) = kind.parse_separated(cell, LIST_SEPARATOR) {
            form.set(field.as_str(), value);
        }
    }
    form
}

fn warn_unknown_columns(wizard: &LoadedWizard, header_map: &HashMap<String, usize>) {
    let mut unknown: Vec<&str> = header_map
        .keys()
        .filter(|h| wizard.property(h).is_none())
        .map(String::as_str)
        .collect();
    unknown.sort_unstable();
    if !unknown.is_empty() {
        eprintln!(
            "{} Ignoring unknown column(s): {}",
            style("!").yellow(),
            unknown.join(", ")
        );
    }
}

/// Print the header row for the wizard's fields, in step order
fn generate_template(wizard: &LoadedWizard) -> Result<()> {
    let headers: Vec<String> = wizard
        .steps()
        .iter()
        .flat_map(|step| step.presented_fields())
        .filter(|f| f != "confirmed")
        .collect();

    println!("{}", headers.join(","));

    // hint goes to stderr so redirected output stays a clean CSV
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: stagecraft import --template > events.csv",
        style("→").blue()
    );
    eprintln!("  separate list entries with '{}'; partners as name:role[:url]", LIST_SEPARATOR);
    Ok(())
}

/// Build a map of header names to column indices
fn build_header_map(headers: &csv::StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .filter(|(h, _)| !h.is_empty())
        .collect()
}
