//! `stagecraft wizard` command - inspect wizard definitions and check form files

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{load_form_file, open_project};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::step::StepDefinition;
use crate::core::Config;
use crate::schema::definition::LoadedWizard;

#[derive(Subcommand, Debug)]
pub enum WizardCommands {
    /// List wizards, or show the steps of one
    Steps(StepsArgs),

    /// Check a form file against every step of a wizard
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct StepsArgs {
    /// Wizard name; lists available wizards when omitted
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// YAML or JSON file with field values
    pub file: PathBuf,

    /// Wizard definition to check against
    #[arg(long, short = 'w')]
    pub wizard: Option<String>,
}

const STEP_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "#", 3),
    ColumnDef::new("id", "ID", 12),
    ColumnDef::new("title", "TITLE", 22),
    ColumnDef::new("required", "REQUIRED", 30),
    ColumnDef::new("conditional", "REQUIRED WHEN", 48),
];

pub fn run(cmd: WizardCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        WizardCommands::Steps(args) => run_steps(args, global),
        WizardCommands::Check(args) => run_check(args, global),
    }
}

fn run_steps(args: StepsArgs, global: &GlobalOpts) -> Result<()> {
    // wizards are usable outside a project; project ones override built-ins
    let project = open_project(global).ok();

    let Some(name) = args.name else {
        for name in LoadedWizard::available(project.as_ref()) {
            println!("{}", name);
        }
        return Ok(());
    };

    let wizard = LoadedWizard::load(&name, project.as_ref())?;
    let rows: Vec<TableRow> = wizard
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| step_row(i, step))
        .collect();

    let format = match global.format {
        OutputFormat::Auto | OutputFormat::Yaml | OutputFormat::Json => OutputFormat::Tsv,
        other => other,
    };
    if format == OutputFormat::Tsv && !global.quiet {
        println!("{}\n", style(wizard.definition.title()).bold());
    }

    let mut formatter = TableFormatter::new(STEP_COLUMNS, "step");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format)
}

fn step_row(index: usize, step: &StepDefinition) -> TableRow {
    let conditional = step
        .conditional
        .iter()
        .map(|rule| format!("{} if {}", rule.field, rule.when))
        .collect::<Vec<_>>()
        .join("; ");

    TableRow::new(step.id.as_str())
        .cell("number", (index + 1).to_string())
        .cell("id", step.id.as_str())
        .cell("title", step.title.as_str())
        .cell("required", step.required.join(", "))
        .cell("conditional", conditional)
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global).ok();
    let config = Config::load_for(project.as_ref());
    let wizard = LoadedWizard::load(
        args.wizard.as_deref().unwrap_or(config.wizard()),
        project.as_ref(),
    )?;

    let mut form = wizard.defaults();
    form.merge(load_form_file(&args.file)?);
    let controller = wizard.controller()?.with_form(form);

    let mut failed = 0;
    for (i, step) in controller.steps().iter().enumerate() {
        match controller.validate_step(i) {
            Ok(()) => {
                if !global.quiet {
                    println!("{} {}. {}", style("✓").green(), i + 1, step.title);
                }
            }
            Err(errors) => {
                failed += 1;
                println!("{} {}. {}", style("✗").red(), i + 1, step.title);
                for (field, message) in errors.iter() {
                    println!("    {} {}", style(wizard.label(field)).yellow(), message);
                }
            }
        }
    }

    if failed == 0 {
        println!();
        println!(
            "{} {} is ready to publish",
            style("✓").green().bold(),
            args.file.display()
        );
        Ok(())
    } else {
        Err(miette::miette!(
            help = "fix the fields above, or run 'stagecraft event new --data FILE' to fill them in",
            "{} of {} step(s) incomplete",
            failed,
            controller.step_count()
        ))
    }
}
