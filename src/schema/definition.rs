//! Wizard definitions: named step lists bound to a form schema
//!
//! Built-in definitions are embedded in the binary; a project may add or
//! override them with `.stagecraft/wizards/<name>.yaml`. A definition's
//! `schema` names an embedded schema or a `<schema>.schema.json` file next
//! to the project definitions.

use miette::Diagnostic;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::form::FormData;
use crate::core::project::Project;
use crate::core::step::StepDefinition;
use crate::core::wizard::WizardController;
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::{SchemaError, SchemaValidator};
use crate::yaml::{parse_yaml, parse_yaml_file, Document, YamlError};

#[derive(Debug, Error, Diagnostic)]
pub enum DefinitionError {
    #[error("unknown wizard '{0}'")]
    #[diagnostic(
        code(stagecraft::wizard::unknown),
        help("run `stagecraft wizard steps` to list available wizards")
    )]
    NotFound(String),

    #[error("wizard '{0}' has no steps")]
    #[diagnostic(code(stagecraft::wizard::no_steps))]
    NoSteps(String),

    #[error("wizard '{wizard}' defines step '{step}' more than once")]
    #[diagnostic(code(stagecraft::wizard::duplicate_step))]
    DuplicateStep { wizard: String, step: String },

    #[error("step '{step}' uses field '{field}', which schema '{schema}' does not define")]
    #[diagnostic(
        code(stagecraft::wizard::unknown_field),
        help("add the field to the schema's `properties` or remove it from the step")
    )]
    UnknownField {
        step: String,
        field: String,
        schema: String,
    },

    #[error("schema '{0}' not found")]
    #[diagnostic(code(stagecraft::wizard::unknown_schema))]
    UnknownSchema(String),

    #[error("schema file {path} is not valid JSON: {message}")]
    #[diagnostic(code(stagecraft::wizard::schema_json))]
    SchemaJson { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// A named, ordered list of steps over one form schema
#[derive(Debug, Clone, Deserialize)]
pub struct WizardDefinition {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Name of the form schema the fields are described by
    pub schema: String,

    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl WizardDefinition {
    /// Parse a definition and check its step list
    pub fn from_yaml(content: &str, filename: &str) -> Result<Self, DefinitionError> {
        let mut definition: WizardDefinition = parse_yaml(content, filename, Document::Wizard)?;
        definition.check_steps()?;
        definition.fill_titles();
        Ok(definition)
    }

    pub fn from_file(path: &Path) -> Result<Self, DefinitionError> {
        let mut definition: WizardDefinition = parse_yaml_file(path, Document::Wizard)?;
        definition.check_steps()?;
        definition.fill_titles();
        Ok(definition)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Untitled steps are shown under their id
    fn fill_titles(&mut self) {
        for step in &mut self.steps {
            if step.title.trim().is_empty() {
                step.title = step.id.clone();
            }
        }
    }

    fn check_steps(&self) -> Result<(), DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::NoSteps(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(DefinitionError::DuplicateStep {
                    wizard: self.name.clone(),
                    step: step.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Every field a step presents, requires or tests in a condition must
    /// be a property of the schema
    pub fn check_fields(&self, schema: &Value) -> Result<(), DefinitionError> {
        let known: BTreeSet<&str> = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default();

        for step in &self.steps {
            let triggers = step
                .conditional
                .iter()
                .filter_map(|rule| rule.when.trigger_field().map(String::from));
            for field in step.presented_fields().into_iter().chain(triggers) {
                if !known.contains(field.as_str()) {
                    return Err(DefinitionError::UnknownField {
                        step: step.id.clone(),
                        field,
                        schema: self.schema.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A definition together with its resolved form schema
#[derive(Debug, Clone)]
pub struct LoadedWizard {
    pub definition: WizardDefinition,
    pub schema: Value,
}

impl LoadedWizard {
    /// Load a wizard by name, preferring the project's own definition
    pub fn load(name: &str, project: Option<&Project>) -> Result<Self, DefinitionError> {
        let registry = SchemaRegistry::default();

        let project_file = project
            .map(|p| p.wizards_dir().join(format!("{}.yaml", name)))
            .filter(|path| path.is_file());

        let definition = match project_file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using project wizard definition");
                WizardDefinition::from_file(&path)?
            }
            None => {
                let source = registry
                    .wizard_source(name)
                    .ok_or_else(|| DefinitionError::NotFound(name.to_string()))?;
                WizardDefinition::from_yaml(source, &format!("{}.yaml", name))?
            }
        };

        Self::resolve(definition, &registry, project)
    }

    /// Bind an already parsed definition to its schema
    pub fn resolve(
        definition: WizardDefinition,
        registry: &SchemaRegistry,
        project: Option<&Project>,
    ) -> Result<Self, DefinitionError> {
        let schema = match registry.get_json(&definition.schema) {
            Some(schema) => schema,
            None => Self::project_schema(&definition.schema, project)?,
        };
        definition.check_fields(&schema)?;
        Ok(Self { definition, schema })
    }

    fn project_schema(name: &str, project: Option<&Project>) -> Result<Value, DefinitionError> {
        let path = project
            .map(|p| p.wizards_dir().join(format!("{}.schema.json", name)))
            .filter(|path| path.is_file())
            .ok_or_else(|| DefinitionError::UnknownSchema(name.to_string()))?;

        let content = std::fs::read_to_string(&path).map_err(|e| DefinitionError::SchemaJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DefinitionError::SchemaJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Names of every wizard available to a project, built-ins first
    pub fn available(project: Option<&Project>) -> Vec<String> {
        let registry = SchemaRegistry::default();
        let mut names: Vec<String> = registry.wizard_names().map(String::from).collect();

        if let Some(project) = project {
            if let Ok(entries) = std::fs::read_dir(project.wizards_dir()) {
                let mut local: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| {
                        let name = e.file_name().to_string_lossy().to_string();
                        name.strip_suffix(".yaml").map(String::from)
                    })
                    .filter(|n| !names.contains(n))
                    .collect();
                local.sort();
                names.extend(local);
            }
        }
        names
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.definition.steps
    }

    /// JSON Schema of a single field
    pub fn property(&self, field: &str) -> Option<&Value> {
        self.schema.get("properties").and_then(|p| p.get(field))
    }

    /// Human label of a field: its schema description, else the field name
    pub fn label(&self, field: &str) -> String {
        self.property(field)
            .and_then(|p| p.get("description"))
            .and_then(|d| d.as_str())
            .map(String::from)
            .unwrap_or_else(|| field.replace('_', " "))
    }

    /// Schema defaults for every property that declares one
    pub fn defaults(&self) -> FormData {
        self.schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(name, prop)| Some((name.clone(), prop.get("default")?.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A fresh controller over this wizard's steps
    pub fn controller(&self) -> Result<WizardController, DefinitionError> {
        let validator = SchemaValidator::new(&self.schema)?;
        WizardController::new(self.definition.steps.clone(), Box::new(validator))
            .map_err(|_| DefinitionError::NoSteps(self.definition.name.clone()))
    }
}
