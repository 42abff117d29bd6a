//! Review rendering for a wizard in progress

use rust_embed::Embed;
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;

use crate::core::observer::WizardObserver;
use crate::core::wizard::WizardController;
use crate::schema::definition::LoadedWizard;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const REVIEW_TEMPLATE: &str = "review.txt.tera";

#[derive(Debug, Serialize)]
struct ReviewField {
    label: String,
    value: String,
    required: bool,
}

#[derive(Debug, Serialize)]
struct ReviewStep {
    number: usize,
    title: String,
    completed: bool,
    fields: Vec<ReviewField>,
}

/// Renders the review shown before publishing
pub struct ReviewRenderer {
    tera: Tera,
}

impl ReviewRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Every step with its fields and current values; `*` marks fields
    /// required under the current answers
    pub fn render<O: WizardObserver>(
        &self,
        wizard: &LoadedWizard,
        controller: &WizardController<O>,
    ) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == REVIEW_TEMPLATE) {
            return Err(TemplateError::NotFound(REVIEW_TEMPLATE.to_string()));
        }

        let form = controller.form();
        let mut filled = 0;
        let mut total = 0;

        let steps: Vec<ReviewStep> = controller
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let fields = step
                    .presented_fields()
                    .into_iter()
                    .map(|name| {
                        total += 1;
                        if form.is_filled(&name) {
                            filled += 1;
                        }
                        ReviewField {
                            label: wizard.label(&name),
                            value: form.get(&name).map(display_value).unwrap_or_default(),
                            required: step.is_required(&name, form),
                        }
                    })
                    .collect();
                ReviewStep {
                    number: i + 1,
                    title: step.title.clone(),
                    completed: controller.is_completed(i),
                    fields,
                }
            })
            .collect();

        let mut context = Context::new();
        context.insert("wizard_title", wizard.definition.title());
        context.insert("steps", &steps);
        context.insert("filled", &filled);
        context.insert("total", &total);

        self.tera
            .render(REVIEW_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

/// One-line rendering of a form value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(obj) => match (obj.get("name"), obj.get("role")) {
                    (Some(Value::String(name)), Some(Value::String(role))) => {
                        format!("{} ({})", name, role)
                    }
                    (Some(Value::String(name)), _) => name.clone(),
                    _ => item.to_string(),
                },
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}
