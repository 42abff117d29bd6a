//! `stagecraft event` command - create, edit and browse events

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{
    describe_wizard_error, load_form_file, open_project, parse_assignments, print_structured,
    success,
};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::form::FormData;
use crate::core::loader::{load_event, load_events};
use crate::core::observer::WizardObserver;
use crate::core::project::Project;
use crate::core::store::{Persistence, ProjectStore};
use crate::core::wizard::WizardController;
use crate::core::Config;
use crate::entities::event::{Category, Event, HighlightType, Ticketing};
use crate::schema::definition::LoadedWizard;
use crate::schema::wizard::{ConsoleObserver, InteractiveWizard, Outcome};

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// Create an event with the wizard
    New(NewArgs),

    /// Re-open a stored event in the wizard
    Edit(EditArgs),

    /// List stored events
    List(ListArgs),

    /// Show a stored event
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Pre-fill a field (repeatable): --set title="Night of Strings"
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Pre-fill fields from a YAML or JSON file
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Wizard definition to use (default: config default_wizard, else "event")
    #[arg(long, short = 'w')]
    pub wizard: Option<String>,

    /// Run every step without prompting and publish
    #[arg(long)]
    pub no_input: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Event ID (full or partial)
    pub id: String,

    /// Step to resume at, 1-based (default: the final step)
    #[arg(long, short = 's')]
    pub step: Option<usize>,

    /// Change a field (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Wizard definition to use
    #[arg(long, short = 'w')]
    pub wizard: Option<String>,

    /// Re-validate and publish without prompting (requires --set confirmed=true)
    #[arg(long)]
    pub no_input: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by category
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Filter by highlight type (none, featured, editor_pick)
    #[arg(long)]
    pub highlight: Option<String>,

    /// Case-insensitive search in title, venue, city and artists
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Event ID (full or partial)
    pub id: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 30),
    ColumnDef::new("date", "DATE", 24),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("category", "CATEGORY", 10),
    ColumnDef::new("venue", "VENUE", 24),
    ColumnDef::new("highlight", "HIGHLIGHT", 11),
];

pub fn run(cmd: EventCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EventCommands::New(args) => run_new(args, global),
        EventCommands::Edit(args) => run_edit(args, global),
        EventCommands::List(args) => run_list(args, global),
        EventCommands::Show(args) => run_show(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_for(Some(&project));
    let wizard = LoadedWizard::load(args.wizard.as_deref().unwrap_or(config.wizard()), Some(&project))?;

    let mut form = wizard.defaults();
    if let Some(ref city) = config.default_city {
        if wizard.property("city").is_some() {
            form.set("city", city.as_str());
        }
    }
    if let Some(ref path) = args.data {
        form.merge(load_form_file(path)?);
    }
    form.merge(parse_assignments(&args.set, &wizard)?);

    let mut store = ProjectStore::new(&project, config.author());
    let controller = wizard.controller()?.with_form(form);

    let id = if args.no_input {
        let mut controller = controller;
        Some(publish_headless(&mut controller, &mut store)?)
    } else {
        let mut controller = controller.with_observer(ConsoleObserver);
        run_interactive(&wizard, &mut controller, &mut store)?
    };

    report_published(&project, id.as_deref(), "Created", global)
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_for(Some(&project));
    let (_, event) = load_event(&project, &args.id)?;
    let wizard = LoadedWizard::load(args.wizard.as_deref().unwrap_or(config.wizard()), Some(&project))?;

    let original = event.to_form();
    let mut form = original.clone();
    form.merge(parse_assignments(&args.set, &wizard)?);

    let resume = args
        .step
        .map(|n| n.saturating_sub(1))
        .unwrap_or(usize::MAX);
    let controller = wizard.controller()?.with_form(form).resume_at(resume);
    tracing::debug!(
        id = %event.id,
        step = controller.current_step(),
        completed = controller.completed_steps().len(),
        "editing event"
    );

    let mut store = ProjectStore::editing(&project, event);
    let (id, changed) = if args.no_input {
        let mut controller = controller;
        let id = publish_headless(&mut controller, &mut store)?;
        (Some(id), is_changed(&original, controller.form()))
    } else {
        let mut controller = controller.with_observer(ConsoleObserver);
        let id = run_interactive(&wizard, &mut controller, &mut store)?;
        (id, is_changed(&original, controller.form()))
    };

    if id.is_some() && !changed && !global.quiet {
        println!("{} No fields changed", style("!").yellow());
    }
    report_published(&project, id.as_deref(), "Updated", global)
}

/// Whether the submitted answers differ from the stored record
fn is_changed(original: &FormData, submitted: &FormData) -> bool {
    let mut submitted = submitted.clone();
    submitted.unset("confirmed");
    submitted.digest() != original.digest()
}

/// Walk every step from the current one and submit
fn publish_headless<O: WizardObserver>(
    controller: &mut WizardController<O>,
    store: &mut dyn Persistence,
) -> Result<String> {
    if let Err(e) = controller.advance_to_end() {
        return Err(describe_wizard_error(controller, e));
    }
    controller
        .submit(store)
        .map_err(|e| describe_wizard_error(controller, e))
}

fn run_interactive(
    wizard: &LoadedWizard,
    controller: &mut WizardController<ConsoleObserver>,
    store: &mut dyn Persistence,
) -> Result<Option<String>> {
    match InteractiveWizard::new(wizard)?.run(controller, store)? {
        Outcome::Submitted(id) => Ok(Some(id)),
        Outcome::Abandoned => {
            println!("{} Discarded, nothing was saved", style("!").yellow());
            Ok(None)
        }
    }
}

fn report_published(project: &Project, id: Option<&str>, verb: &str, global: &GlobalOpts) -> Result<()> {
    let Some(id) = id else {
        return Ok(());
    };

    if global.format == OutputFormat::Id {
        println!("{}", id);
        return Ok(());
    }

    let path = project.events_dir().join(format!("{}.yaml", id));
    let shown = path
        .strip_prefix(project.root())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string());
    success(
        global,
        format!("{} event {} ({})", verb, style(id).cyan(), style(shown).dim()),
    );
    Ok(())
}

fn matches_filters(event: &Event, args: &ListArgs) -> Result<bool> {
    if let Some(ref category) = args.category {
        let category: Category = category.parse().map_err(|e: String| miette::miette!("{}", e))?;
        if event.category != category {
            return Ok(false);
        }
    }
    if let Some(ref highlight) = args.highlight {
        let highlight: HighlightType = highlight
            .parse()
            .map_err(|e: String| miette::miette!("{}", e))?;
        if event.highlight_type != highlight {
            return Ok(false);
        }
    }
    if let Some(ref needle) = args.search {
        let needle = needle.to_lowercase();
        let haystack = [
            Some(event.title.as_str()),
            Some(event.venue.as_str()),
            event.city.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(event.artists.iter().map(String::as_str));
        if !haystack.into_iter().any(|s| s.to_lowercase().contains(&needle)) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_for(Some(&project));
    let format = global.format.or_configured(config.default_format.as_deref());

    let mut events = Vec::new();
    for event in load_events(&project) {
        if matches_filters(&event, &args)? {
            events.push(event);
        }
    }
    events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.title.cmp(&b.title)));
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    if args.count {
        println!("{}", events.len());
        return Ok(());
    }

    match format {
        OutputFormat::Yaml => print_structured(&events, false),
        OutputFormat::Json => print_structured(&events, true),
        _ => {
            let full_ids = matches!(format, OutputFormat::Csv | OutputFormat::Id);
            let rows: Vec<TableRow> = events
                .iter()
                .map(|e| {
                    let id = if full_ids { e.id.to_string() } else { e.id.short() };
                    TableRow::new(e.id.to_string())
                        .cell("id", id)
                        .cell("date", e.date_label())
                        .cell("title", e.title.as_str())
                        .cell("category", e.category.to_string())
                        .cell("venue", e.venue.as_str())
                        .cell("highlight", e.highlight_type.to_string())
                })
                .collect();

            let mut formatter = TableFormatter::new(COLUMNS, "event");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(&rows, format)
        }
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, event) = load_event(&project, &args.id)?;

    match global.format {
        OutputFormat::Json => print_structured(&event, true),
        OutputFormat::Id => {
            println!("{}", event.id);
            Ok(())
        }
        OutputFormat::Auto if !global.quiet => {
            print_summary(&event);
            Ok(())
        }
        _ => print_structured(&event, false),
    }
}

fn print_summary(event: &Event) {
    println!("{}", style(&event.title).bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("{:<12} {}", style("ID").dim(), style(event.id).cyan());
    println!("{:<12} {}", style("Category").dim(), event.category);
    println!("{:<12} {}", style("Date").dim(), event.date_label());
    if let Some(ref time) = event.start_time {
        println!("{:<12} {}", style("Time").dim(), time);
    }
    let place = match event.city {
        Some(ref city) => format!("{}, {}", event.venue, city),
        None => event.venue.clone(),
    };
    println!("{:<12} {}", style("Venue").dim(), place);
    if !event.artists.is_empty() {
        println!("{:<12} {}", style("Artists").dim(), event.artists.join(", "));
    }
    let organizers = event.organizer_names();
    if !organizers.is_empty() {
        println!("{:<12} {}", style("Organizers").dim(), organizers.join(", "));
    }
    let sponsors: Vec<&str> = event.partners.sponsors().map(|p| p.name.as_str()).collect();
    if !sponsors.is_empty() {
        println!("{:<12} {}", style("Sponsors").dim(), sponsors.join(", "));
    }
    let tickets = match (event.ticketing, event.price) {
        (Ticketing::Paid, Some(price)) => format!("paid, from {}", price),
        (ticketing, _) => ticketing.to_string(),
    };
    println!("{:<12} {}", style("Tickets").dim(), tickets);
    if event.highlight_type != HighlightType::None {
        println!("{:<12} {}", style("Highlight").dim(), event.highlight_type);
        for reason in &event.selection_reasons {
            println!("{:<12} - {}", "", reason);
        }
    }
    println!("{:<12} {} by {}", style("Status").dim(), event.status, event.author);
    if let Some(ref summary) = event.summary {
        println!();
        println!("{}", summary);
    }
}
