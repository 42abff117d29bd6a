//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::form::FormData;
use crate::core::project::Project;
use crate::core::wizard::{WizardController, WizardError};
use crate::core::observer::WizardObserver;
use crate::schema::definition::LoadedWizard;
use crate::schema::wizard::FieldKind;
use crate::yaml::{parse_yaml_file, Document};

/// Project from `--project`, else discovered from the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Parse repeated `--set key=value` flags into form data
///
/// Values are converted by the field's schema type, so `title=1984` stays
/// text while `price=12.5` becomes a number.
pub fn parse_assignments(assignments: &[String], wizard: &LoadedWizard) -> Result<FormData> {
    let mut form = FormData::new();
    for raw in assignments {
        let (key, text) = FormData::split_assignment(raw).ok_or_else(|| {
            miette::miette!(
                help = "use key=value, e.g. --set title=\"Night of Strings\"",
                "invalid assignment '{}'",
                raw
            )
        })?;
        let kind = FieldKind::from_schema(wizard.property(key));
        form.set(key, kind.parse_assignment(text));
    }
    Ok(form)
}

/// Read a YAML (or JSON) mapping of field values
pub fn load_form_file(path: &Path) -> Result<FormData> {
    let value: Value = parse_yaml_file(path, Document::Form)?;
    if !value.is_object() {
        return Err(miette::miette!(
            "{} must contain a mapping of field names to values",
            path.display()
        ));
    }
    Ok(FormData::from_json(value))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Turn a failed headless run into an error naming the blocking step
pub fn describe_wizard_error<O: WizardObserver>(
    controller: &WizardController<O>,
    error: WizardError,
) -> miette::Report {
    match error {
        WizardError::Validation(errors) => {
            // submit re-checks every step, so the failure may sit earlier
            let index = controller
                .steps()
                .iter()
                .position(|s| {
                    s.presented_fields()
                        .iter()
                        .any(|f| errors.contains(f))
                })
                .unwrap_or_else(|| controller.current_step());
            let step = &controller.steps()[index];
            let details = errors
                .iter()
                .map(|(field, message)| format!("  {}: {}", field, message))
                .collect::<Vec<_>>()
                .join("\n");
            miette::miette!(
                help = "supply the fields with --set key=value or --data FILE",
                "step {} ({}) is incomplete:\n{}",
                index + 1,
                step.title,
                details
            )
        }
        other => miette::Report::new(other),
    }
}

/// Print a success line unless quiet
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Serialize for `--format yaml|json`
pub fn print_structured<T: serde::Serialize>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    } else {
        print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    }
    Ok(())
}
