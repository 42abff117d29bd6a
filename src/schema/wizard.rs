//! Interactive terminal host for a wizard
//!
//! Renders the current step as prompts derived from the form schema, then
//! offers the moves the controller allows. All state lives in the
//! controller; abandoning the session drops it without persisting.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

use crate::core::observer::WizardObserver;
use crate::core::store::Persistence;
use crate::core::wizard::{WizardController, WizardError};
use crate::entities::partner::Partner;
use crate::schema::definition::LoadedWizard;
use crate::schema::template::{display_value, ReviewRenderer};
use crate::schema::validator::FieldErrors;

/// Prints validation and submission failures to the terminal
///
/// Successful submissions are reported by the command that started the
/// wizard, since it knows where the record went.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl WizardObserver for ConsoleObserver {
    fn on_validation_error(&mut self, errors: &FieldErrors) {
        eprintln!(
            "{} {} field(s) need attention:",
            style("✗").red(),
            errors.len()
        );
        for (field, message) in errors.iter() {
            eprintln!("   {} {}", style(field).yellow(), message);
        }
    }

    fn on_submit_error(&mut self, reason: &str) {
        eprintln!("{} Publishing failed: {}", style("✗").red(), reason);
        eprintln!("  your answers are kept; choose Publish to try again");
    }
}

/// How an interactive session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted(String),
    Abandoned,
}

/// Input shape of a field, derived from its schema
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Choice(Vec<String>),
    Number { integer: bool },
    Flag,
    List,
    Partners,
}

impl FieldKind {
    pub fn from_schema(schema: Option<&Value>) -> Self {
        let Some(schema) = schema else {
            return FieldKind::Text;
        };

        if let Some(values) = schema.get("enum").and_then(|e| e.as_array()) {
            return FieldKind::Choice(
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect(),
            );
        }

        match schema.get("type").and_then(|t| t.as_str()) {
            Some("integer") => FieldKind::Number { integer: true },
            Some("number") => FieldKind::Number { integer: false },
            Some("boolean") => FieldKind::Flag,
            Some("array") => {
                let items = schema.get("items");
                let object_items = items
                    .and_then(|i| i.get("type"))
                    .and_then(|t| t.as_str())
                    == Some("object");
                let has_roles = items
                    .and_then(|i| i.get("properties"))
                    .is_some_and(|p| p.get("role").is_some());
                if object_items && has_roles {
                    FieldKind::Partners
                } else {
                    FieldKind::List
                }
            }
            _ => FieldKind::Text,
        }
    }

    /// Convert typed text into a form value; `None` clears the field
    ///
    /// Text that cannot be converted is kept as a string so validation can
    /// report it against the field.
    pub fn parse_answer(&self, input: &str) -> Option<Value> {
        self.parse_separated(input, ',')
    }

    /// Like [`parse_answer`](Self::parse_answer) with a custom list separator
    pub fn parse_separated(&self, input: &str, separator: char) -> Option<Value> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let value = match self {
            FieldKind::Text | FieldKind::Choice(_) => Value::String(input.to_string()),
            FieldKind::Number { integer: true } => input
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(input.to_string())),
            FieldKind::Number { integer: false } => input
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(input.to_string())),
            FieldKind::Flag => match input.to_lowercase().as_str() {
                "y" | "yes" | "true" => Value::Bool(true),
                "n" | "no" | "false" => Value::Bool(false),
                _ => Value::String(input.to_string()),
            },
            FieldKind::List => Value::Array(
                split_list(input, separator)
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            FieldKind::Partners => Value::Array(
                split_list(input, separator)
                    .map(|spec| match Partner::parse_spec(spec) {
                        Some(partner) => serde_json::to_value(partner)
                            .unwrap_or_else(|_| Value::String(spec.to_string())),
                        None => Value::String(spec.to_string()),
                    })
                    .collect(),
            ),
        };
        Some(value)
    }

    /// Convert a `--set` value
    ///
    /// List fields also accept a JSON array. An empty value clears the
    /// field so it can override a default.
    pub fn parse_assignment(&self, input: &str) -> Value {
        let input = input.trim();
        if matches!(self, FieldKind::List | FieldKind::Partners) && input.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(input) {
                return value;
            }
        }
        self.parse_answer(input).unwrap_or_else(|| match self {
            FieldKind::List | FieldKind::Partners => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        })
    }

    /// Current value as it should be pre-filled at the prompt
    fn format_answer(&self, value: &Value) -> String {
        match (self, value) {
            (FieldKind::Partners, Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let name = item.get("name").and_then(|v| v.as_str()).unwrap_or("");
                    let role = item.get("role").and_then(|v| v.as_str()).unwrap_or("partner");
                    match item.get("url").and_then(|v| v.as_str()) {
                        Some(url) => format!("{}:{}:{}", name, role, url),
                        None => format!("{}:{}", name, role),
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
            _ => display_value(value),
        }
    }
}

/// Preselected item: the current value, else "(none)" for optional fields
fn choice_default(values: &[String], current: Option<&str>, required: bool) -> usize {
    match current.and_then(|c| values.iter().position(|v| v == c)) {
        Some(index) => index,
        None if required => 0,
        None => values.len(),
    }
}

fn split_list(input: &str, separator: char) -> impl Iterator<Item = &str> {
    input.split(separator).map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Next,
    Back,
    Jump,
    Edit,
    Review,
    Publish,
    Abandon,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::Next => "Next step",
            Action::Back => "Previous step",
            Action::Jump => "Jump to step...",
            Action::Edit => "Edit this step again",
            Action::Review => "Review everything",
            Action::Publish => "Publish",
            Action::Abandon => "Abandon",
        }
    }
}

/// Drives a [`WizardController`] with terminal prompts
pub struct InteractiveWizard<'a> {
    wizard: &'a LoadedWizard,
    renderer: ReviewRenderer,
    theme: ColorfulTheme,
}

impl<'a> InteractiveWizard<'a> {
    pub fn new(wizard: &'a LoadedWizard) -> Result<Self> {
        Ok(Self {
            wizard,
            renderer: ReviewRenderer::new().into_diagnostic()?,
            theme: ColorfulTheme::default(),
        })
    }

    /// Run until the form is published or the user abandons it
    pub fn run<O: WizardObserver>(
        &self,
        controller: &mut WizardController<O>,
        store: &mut dyn Persistence,
    ) -> Result<Outcome> {
        println!();
        println!(
            "{} {}",
            style("◆").cyan(),
            style(self.wizard.definition.title()).bold()
        );

        let mut prompt_fields = true;
        loop {
            if prompt_fields {
                self.print_header(controller);
                self.prompt_step(controller)?;
            }
            prompt_fields = true;

            match self.choose_action(controller)? {
                Action::Next => {
                    // field errors are reported by the observer
                    if controller.go_next().is_err() {
                        continue;
                    }
                }
                Action::Back => {
                    controller.go_previous();
                }
                Action::Jump => {
                    let target = self.choose_step(controller)?;
                    if let Err(e) = controller.go_to_step(target) {
                        if e.is_inaccessible() {
                            println!(
                                "{} Step {} is not reachable yet",
                                style("!").yellow(),
                                target + 1
                            );
                            prompt_fields = false;
                        }
                    }
                }
                Action::Edit => {}
                Action::Review => {
                    println!();
                    println!("{}", self.renderer.render(self.wizard, controller).into_diagnostic()?);
                    prompt_fields = false;
                }
                Action::Publish => match controller.submit(store) {
                    Ok(id) => return Ok(Outcome::Submitted(id)),
                    Err(WizardError::Validation(errors)) => {
                        self.point_to_steps(controller, &errors);
                        prompt_fields = false;
                    }
                    Err(_) => {
                        // answers are kept; Publish again retries
                        prompt_fields = false;
                    }
                },
                Action::Abandon => {
                    let sure = Confirm::with_theme(&self.theme)
                        .with_prompt("Discard this event?")
                        .default(false)
                        .interact()
                        .into_diagnostic()?;
                    if sure {
                        return Ok(Outcome::Abandoned);
                    }
                    prompt_fields = false;
                }
            }
        }
    }

    fn print_header<O: WizardObserver>(&self, controller: &WizardController<O>) {
        let step = controller.current();
        println!();
        println!(
            "{} Step {}/{}: {}",
            style("▸").cyan(),
            controller.current_step() + 1,
            controller.step_count(),
            style(&step.title).bold()
        );
        if let Some(ref description) = step.description {
            println!("  {}", style(description).dim());
        }
        println!("{}", style("─".repeat(50)).dim());
    }

    /// Prompt every field the current step presents
    ///
    /// Conditional fields are skipped while their condition does not hold.
    fn prompt_step<O: WizardObserver>(&self, controller: &mut WizardController<O>) -> Result<()> {
        let step = controller.current().clone();

        for field in step.presented_fields() {
            let conditional_only = step.conditional.iter().any(|r| r.field == field)
                && !step.required.contains(&field);
            if conditional_only && !step.is_required(&field, controller.form()) {
                continue;
            }

            let required = step.is_required(&field, controller.form());
            let answer = self.prompt_field(&field, required, controller.form().get(&field))?;
            match answer {
                Some(value) => controller.form_mut().set(field, value),
                None => {
                    controller.form_mut().unset(&field);
                }
            }
        }
        Ok(())
    }

    fn prompt_field(&self, field: &str, required: bool, current: Option<&Value>) -> Result<Option<Value>> {
        let kind = FieldKind::from_schema(self.wizard.property(field));
        let label = if required {
            format!("{} {}", self.wizard.label(field), style("*").red())
        } else {
            self.wizard.label(field)
        };

        match &kind {
            FieldKind::Choice(values) => {
                let current = current.and_then(|v| v.as_str());
                let mut items: Vec<&str> = values.iter().map(String::as_str).collect();
                if !required {
                    items.push("(none)");
                }
                let default_idx = choice_default(values, current, required);

                let selection = Select::with_theme(&self.theme)
                    .with_prompt(&label)
                    .items(&items)
                    .default(default_idx)
                    .interact()
                    .into_diagnostic()?;

                Ok(values.get(selection).map(|v| Value::String(v.clone())))
            }

            FieldKind::Flag => {
                let default_val = current.and_then(|v| v.as_bool()).unwrap_or(false);
                let value = Confirm::with_theme(&self.theme)
                    .with_prompt(&label)
                    .default(default_val)
                    .interact()
                    .into_diagnostic()?;
                Ok(Some(Value::Bool(value)))
            }

            _ => {
                let hint = match kind {
                    FieldKind::List => " (comma-separated)",
                    FieldKind::Partners => " (name:role[:url], comma-separated)",
                    _ => "",
                };
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(format!("{}{}", label, style(hint).dim()))
                    .allow_empty(true);
                if let Some(value) = current {
                    input = input.default(kind.format_answer(value));
                }
                let text = input.interact_text().into_diagnostic()?;
                Ok(kind.parse_answer(&text))
            }
        }
    }

    fn choose_action<O: WizardObserver>(&self, controller: &WizardController<O>) -> Result<Action> {
        let mut actions = Vec::new();
        if controller.is_terminal() {
            actions.extend([Action::Publish, Action::Review]);
        } else {
            actions.push(Action::Next);
        }
        if controller.current_step() > 0 {
            actions.push(Action::Back);
        }
        actions.extend([Action::Jump, Action::Edit]);
        if !controller.is_terminal() {
            actions.push(Action::Review);
        }
        actions.push(Action::Abandon);

        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()
            .into_diagnostic()?;

        Ok(actions[selection])
    }

    fn choose_step<O: WizardObserver>(&self, controller: &WizardController<O>) -> Result<usize> {
        let items: Vec<String> = controller
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let marker = if i == controller.current_step() {
                    "●"
                } else if controller.is_completed(i) {
                    "✓"
                } else if controller.can_access(i) || i == controller.current_step() + 1 {
                    "○"
                } else {
                    "·"
                };
                format!("{} {}. {}", marker, i + 1, step.title)
            })
            .collect();

        Select::with_theme(&self.theme)
            .with_prompt("Go to")
            .items(&items)
            .default(controller.current_step())
            .interact()
            .into_diagnostic()
    }

    /// After a blocked publish, say which steps hold the failing fields
    fn point_to_steps<O: WizardObserver>(&self, controller: &WizardController<O>, errors: &FieldErrors) {
        for (field, _) in errors.iter() {
            if let Some(index) = controller
                .steps()
                .iter()
                .position(|s| s.presented_fields().iter().any(|f| f == field))
            {
                println!(
                    "   {} is on step {} ({})",
                    style(field).yellow(),
                    index + 1,
                    controller.steps()[index].title
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind_of(field: &str) -> FieldKind {
        let wizard = LoadedWizard::load("event", None).unwrap();
        FieldKind::from_schema(wizard.property(field))
    }

    #[test]
    fn test_field_kinds_from_event_schema() {
        assert_eq!(kind_of("title"), FieldKind::Text);
        assert!(matches!(kind_of("category"), FieldKind::Choice(ref v) if v.len() == 8));
        assert_eq!(kind_of("price"), FieldKind::Number { integer: false });
        assert_eq!(kind_of("confirmed"), FieldKind::Flag);
        assert_eq!(kind_of("artists"), FieldKind::List);
        assert_eq!(kind_of("partners"), FieldKind::Partners);
        assert_eq!(FieldKind::from_schema(None), FieldKind::Text);
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(FieldKind::Text.parse_answer("   "), None);
        assert_eq!(
            FieldKind::List.parse_answer("Quartet Nova, , DJ Sol"),
            Some(json!(["Quartet Nova", "DJ Sol"]))
        );
        assert_eq!(
            FieldKind::Number { integer: false }.parse_answer("12.5"),
            Some(json!(12.5))
        );
        assert_eq!(
            FieldKind::Number { integer: true }.parse_answer("twelve"),
            Some(json!("twelve"))
        );
        assert_eq!(FieldKind::Flag.parse_answer("yes"), Some(json!(true)));
    }

    #[test]
    fn test_choice_default() {
        let values: Vec<String> = ["free", "paid"].iter().map(|s| s.to_string()).collect();
        assert_eq!(choice_default(&values, Some("paid"), false), 1);
        assert_eq!(choice_default(&values, None, true), 0);
        // unset optional field lands on "(none)"
        assert_eq!(choice_default(&values, None, false), 2);
        assert_eq!(choice_default(&values, Some("donation"), false), 2);
    }

    #[test]
    fn test_parse_assignment_follows_field_type() {
        assert_eq!(kind_of("title").parse_assignment("1984"), json!("1984"));
        assert_eq!(kind_of("city").parse_assignment("null"), json!("null"));
        assert_eq!(kind_of("price").parse_assignment("12.5"), json!(12.5));
        assert_eq!(kind_of("confirmed").parse_assignment("true"), json!(true));
        assert_eq!(
            kind_of("artists").parse_assignment(r#"["Nova, Quartet", "DJ Sol"]"#),
            json!(["Nova, Quartet", "DJ Sol"])
        );
        assert_eq!(
            kind_of("artists").parse_assignment("Quartet Nova, DJ Sol"),
            json!(["Quartet Nova", "DJ Sol"])
        );
        assert_eq!(
            kind_of("partners").parse_assignment("City Arts:organizer"),
            json!([{ "name": "City Arts", "role": "organizer" }])
        );
        assert_eq!(kind_of("city").parse_assignment(""), json!(""));
        assert_eq!(kind_of("artists").parse_assignment(" "), json!([]));
    }

    #[test]
    fn test_parse_partner_answer() {
        let value = FieldKind::Partners
            .parse_answer("City Arts:organizer, Brewery:sponsor:https://brew.example")
            .unwrap();
        assert_eq!(
            value,
            json!([
                { "name": "City Arts", "role": "organizer" },
                { "name": "Brewery", "role": "sponsor", "url": "https://brew.example" }
            ])
        );
        assert_eq!(FieldKind::Partners.format_answer(&value), "City Arts:organizer, Brewery:sponsor:https://brew.example");
    }
}
