//! Step definitions and the conditional-requirement rule table

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::core::form::FormData;

/// In-process predicate over the live form data
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&FormData) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&FormData) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// When a conditional field becomes required
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Another field holds exactly this value
    Equals { field: String, value: Value },
    /// Another field holds one of these values
    OneOf { field: String, values: Vec<Value> },
    /// Another field is filled in
    Present { field: String },
    /// Arbitrary check supplied in code
    #[serde(skip)]
    Custom(Predicate),
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn one_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::OneOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn present(field: impl Into<String>) -> Self {
        Condition::Present {
            field: field.into(),
        }
    }

    pub fn custom(f: impl Fn(&FormData) -> bool + Send + Sync + 'static) -> Self {
        Condition::Custom(Predicate::new(f))
    }

    /// Evaluate against the current form snapshot
    pub fn holds(&self, form: &FormData) -> bool {
        match self {
            Condition::Equals { field, value } => form.get(field) == Some(value),
            Condition::OneOf { field, values } => form
                .get(field)
                .is_some_and(|current| values.contains(current)),
            Condition::Present { field } => form.is_filled(field),
            Condition::Custom(predicate) => (predicate.0)(form),
        }
    }

    /// The field this condition reads, if it is declarative
    pub fn trigger_field(&self) -> Option<&str> {
        match self {
            Condition::Equals { field, .. }
            | Condition::OneOf { field, .. }
            | Condition::Present { field } => Some(field),
            Condition::Custom(_) => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals { field, value } => write!(f, "{} = {}", field, value),
            Condition::OneOf { field, values } => {
                let opts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} in [{}]", field, opts.join(", "))
            }
            Condition::Present { field } => write!(f, "{} is set", field),
            Condition::Custom(_) => write!(f, "custom rule"),
        }
    }
}

/// A field that is required only while its condition holds
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalRule {
    pub field: String,
    pub when: Condition,
}

/// One step of a wizard
#[derive(Debug, Clone, Deserialize)]
pub struct StepDefinition {
    /// Stable identifier (e.g. "schedule")
    pub id: String,

    /// Heading shown to the user
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Every field the step presents, in prompt order
    #[serde(default)]
    pub fields: Vec<String>,

    /// Fields that must be filled before leaving the step
    #[serde(default)]
    pub required: Vec<String>,

    /// Fields required only when their condition holds
    #[serde(default)]
    pub conditional: Vec<ConditionalRule>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: None,
            fields: Vec::new(),
            required: Vec::new(),
            conditional: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Present an optional field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn require_when(mut self, name: impl Into<String>, when: Condition) -> Self {
        self.conditional.push(ConditionalRule {
            field: name.into(),
            when,
        });
        self
    }

    /// Fields to validate right now: required ones, then each conditional
    /// field whose condition holds on `form`. Evaluated on every call.
    pub fn fields_to_validate(&self, form: &FormData) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let active = self
            .conditional
            .iter()
            .filter(|rule| rule.when.holds(form))
            .map(|rule| &rule.field);

        for name in self.required.iter().chain(active) {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }

    /// Fields to check before leaving the step: the active required set,
    /// then every other presented field that holds a value. Unfilled
    /// optional fields are skipped.
    pub fn fields_to_check(&self, form: &FormData) -> Vec<String> {
        let mut out = self.fields_to_validate(form);
        for name in self.presented_fields() {
            if form.is_filled(&name) && !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    /// Every field the step touches, in prompt order
    pub fn presented_fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let declared = self
            .fields
            .iter()
            .chain(self.required.iter())
            .chain(self.conditional.iter().map(|r| &r.field));

        for name in declared {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }

    /// Whether `field` is required right now
    pub fn is_required(&self, field: &str, form: &FormData) -> bool {
        self.required.iter().any(|r| r == field)
            || self
                .conditional
                .iter()
                .any(|rule| rule.field == field && rule.when.holds(form))
    }
}
