//! `stagecraft validate` command - check stored events against the record schema

use console::style;
use miette::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::helpers::open_project;
use crate::cli::GlobalOpts;
use crate::core::loader::record_files;
use crate::entities::event::Event;
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::RecordValidator;
use crate::yaml::{parse_yaml, Document};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Files or directories to validate (default: the project's events/)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let files = if args.paths.is_empty() {
        record_files(&open_project(global)?.events_dir())
    } else {
        expand_paths(&args.paths)
    };

    let registry = SchemaRegistry::default();
    let schema = registry
        .get_json("event.record")
        .ok_or_else(|| miette::miette!("embedded schema 'event.record' is missing"))?;
    let validator = RecordValidator::new(&schema)?;

    let mut stats = ValidationStats::default();

    if !global.quiet {
        println!(
            "{} Validating {} file(s)...\n",
            style("→").blue(),
            files.len()
        );
    }

    for path in &files {
        stats.files_checked += 1;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                stats.files_failed += 1;
                stats.total_errors += 1;
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        if let Err(e) = validator.validate(&content, &filename) {
            stats.files_failed += 1;
            stats.total_errors += e.violation_count();
            if !args.summary {
                println!(
                    "{} {} - {} error(s)",
                    style("✗").red(),
                    path.display(),
                    e.violation_count()
                );
                println!("{:?}", miette::Report::new(e));
            }
            if !args.keep_going {
                break;
            }
            continue;
        }

        let warnings = record_warnings(&content, &filename);
        if warnings.is_empty() {
            stats.files_passed += 1;
            if !args.summary && !global.quiet {
                println!("{} {}", style("✓").green(), path.display());
            }
            continue;
        }

        stats.total_warnings += warnings.len();
        if !args.summary {
            println!(
                "{} {} - {} warning(s)",
                style("!").yellow(),
                path.display(),
                warnings.len()
            );
            for warning in &warnings {
                println!("    {}", style(warning).yellow());
            }
        }
        if args.strict {
            stats.files_failed += 1;
            if !args.keep_going {
                break;
            }
        } else {
            stats.files_passed += 1;
        }
    }

    print_summary(&stats);

    match stats.files_failed {
        0 => {
            println!("{} All files passed validation!", style("✓").green().bold());
            Ok(())
        }
        1 => Err(miette::miette!("Validation failed: 1 file has errors")),
        n => Err(miette::miette!("Validation failed: {} files have errors", n)),
    }
}

/// Consistency problems the record schema cannot express
fn record_warnings(content: &str, filename: &str) -> Vec<String> {
    let event: Event = match parse_yaml(content, filename, Document::EventRecord) {
        Ok(e) => e,
        Err(e) => return vec![format!("record could not be loaded: {}", e)],
    };

    let mut warnings = Vec::new();
    let expected = format!("{}.yaml", event.id);
    if filename != expected {
        warnings.push(format!("file name should be {}", expected));
    }
    if let Some(end) = event.end_date {
        if end < event.start_date {
            warnings.push(format!(
                "end_date {} is before start_date {}",
                end, event.start_date
            ));
        }
    }
    if event.partners.organizers().next().is_none() {
        warnings.push("no organizer listed among partners".to_string());
    }
    warnings
}

fn print_summary(stats: &ValidationStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings: {}", style(stats.total_warnings).yellow());
    }
    println!();
}

fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_yaml(e.path()))
                    .map(|e| e.path().to_path_buf()),
            );
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    files
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
