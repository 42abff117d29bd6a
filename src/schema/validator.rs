//! Field and record validation with detailed error reporting
//!
//! Two flavours live here:
//! - [`FieldValidator`] checks a list of form fields and returns per-field
//!   messages. The wizard uses it to gate step transitions.
//! - [`RecordValidator`] checks a stored YAML record against a full JSON
//!   Schema and reports violations with source spans.

use chrono::{NaiveDate, NaiveTime};
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::core::form::FormData;

/// Message used for missing fields
pub const REQUIRED: &str = "required";

/// Failing fields mapped to human-readable reasons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error, Diagnostic)]
#[serde(transparent)]
#[error("{} field(s) need attention: {}", self.len(), self.summary())]
#[diagnostic(
    code(stagecraft::wizard::validation),
    help("fill in the listed fields and try again")
)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    /// Keep the first message recorded for each field
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.errors {
            self.errors.entry(field).or_insert(message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Ok(())` when empty, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl FromIterator<(String, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// Validation collaborator used by the wizard
///
/// Given the fields that must hold and the current form data, report every
/// failing field with a message. Implementations must not mutate anything.
pub trait FieldValidator {
    fn validate(&self, fields: &[String], form: &FormData) -> Result<(), FieldErrors>;
}

/// Checks only that each field is filled
#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceValidator;

impl FieldValidator for PresenceValidator {
    fn validate(&self, fields: &[String], form: &FormData) -> Result<(), FieldErrors> {
        fields
            .iter()
            .filter(|f| !form.is_filled(f))
            .map(|f| (f.clone(), REQUIRED.to_string()))
            .collect::<FieldErrors>()
            .into_result()
    }
}

/// Errors raised while compiling a schema
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("Schema has no 'properties' object")]
    #[diagnostic(code(stagecraft::schema::no_properties))]
    NoProperties,

    #[error("Invalid schema for property '{property}': {message}")]
    #[diagnostic(code(stagecraft::schema::invalid_property))]
    InvalidProperty { property: String, message: String },

    #[error("Invalid schema: {0}")]
    #[diagnostic(code(stagecraft::schema::invalid))]
    Invalid(String),
}

struct FieldSchema {
    compiled: JsonValidator,
    format: Option<String>,
}

/// Field validator backed by the `properties` of a JSON Schema
///
/// Each property is compiled on its own so a single field can be checked
/// without the rest of the document being present.
pub struct SchemaValidator {
    fields: HashMap<String, FieldSchema>,
}

impl SchemaValidator {
    pub fn new(schema: &JsonValue) -> Result<Self, SchemaError> {
        let properties = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .ok_or(SchemaError::NoProperties)?;

        let mut fields = HashMap::new();
        for (name, prop_schema) in properties {
            // date and time formats are checked with chrono in check_value
            let compiled = jsonschema::options()
                .should_validate_formats(false)
                .build(prop_schema)
                .map_err(|e| SchemaError::InvalidProperty {
                    property: name.clone(),
                    message: e.to_string(),
                })?;
            let format = prop_schema
                .get("format")
                .and_then(|f| f.as_str())
                .map(String::from);
            fields.insert(name.clone(), FieldSchema { compiled, format });
        }

        Ok(Self { fields })
    }

    /// Whether the schema describes this field
    pub fn knows(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn check_value(&self, field: &str, value: &JsonValue) -> Option<String> {
        let schema = self.fields.get(field)?;

        if let Some(error) = schema.compiled.iter_errors(value).next() {
            return Some(format_field_error(&error));
        }

        match (schema.format.as_deref(), value.as_str()) {
            (Some("date"), Some(s)) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() => {
                Some(format!("'{}' is not a valid date (expected YYYY-MM-DD)", s))
            }
            (Some("time"), Some(s))
                if s.len() != 5 || NaiveTime::parse_from_str(s, "%H:%M").is_err() =>
            {
                Some(format!("'{}' is not a valid time (expected HH:MM)", s))
            }
            _ => None,
        }
    }
}

impl FieldValidator for SchemaValidator {
    fn validate(&self, fields: &[String], form: &FormData) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in fields {
            if !form.is_filled(field) {
                errors.insert(field.clone(), REQUIRED);
                continue;
            }
            if let Some(value) = form.get(field) {
                if let Some(message) = self.check_value(field, value) {
                    errors.insert(field.clone(), message);
                }
            }
        }

        errors.into_result()
    }
}

/// Format a JSON Schema error for a single field value
fn format_field_error(error: &JsonSchemaError) -> String {
    let location = if error.instance_path.as_str().is_empty() {
        String::new()
    } else {
        format!(" at '{}'", error.instance_path)
    };

    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("missing '{}'{}", prop, location)
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            format!("wrong type{}: expected {:?}", location, kind)
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            format!("must be one of: {}{}", format_enum_options(options), location)
        }
        jsonschema::error::ValidationErrorKind::Pattern { .. } => {
            format!("does not match the expected format{}", location)
        }
        jsonschema::error::ValidationErrorKind::MinLength { limit } => {
            format!("too short{}: minimum {} characters", location, limit)
        }
        jsonschema::error::ValidationErrorKind::MaxLength { limit } => {
            format!("too long{}: maximum {} characters", location, limit)
        }
        jsonschema::error::ValidationErrorKind::Minimum { limit } => {
            format!("too small{}: minimum {}", location, limit)
        }
        jsonschema::error::ValidationErrorKind::Maximum { limit } => {
            format!("too large{}: maximum {}", location, limit)
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("unknown field(s){}: {}", location, unexpected.join(", "))
        }
        _ => error.to_string(),
    }
}

/// Format enum options as a string
fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}

// ============================================================================
// Record validation
// ============================================================================

/// Record validation error with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(stagecraft::schema::validation_error))]
pub struct RecordError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl RecordError {
    pub fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Validates stored YAML records against a full JSON Schema
pub struct RecordValidator {
    compiled: JsonValidator,
}

impl RecordValidator {
    pub fn new(schema: &JsonValue) -> Result<Self, SchemaError> {
        let compiled = validator_for(schema).map_err(|e| SchemaError::Invalid(e.to_string()))?;
        Ok(Self { compiled })
    }

    /// Validate YAML content, collecting every violation
    pub fn validate(&self, content: &str, filename: &str) -> Result<(), RecordError> {
        let yaml_value: serde_yml::Value = match serde_yml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                let span = find_error_span(content, e.location());
                let violation = SchemaViolation::new(
                    format!("YAML parse error: {}", e),
                    "invalid YAML".to_string(),
                    span,
                    Some("Check YAML syntax - proper indentation, colons, quotes".to_string()),
                );
                return Err(RecordError::new(filename, content, vec![violation]));
            }
        };

        let json_value: JsonValue = match serde_json::to_value(&yaml_value) {
            Ok(v) => v,
            Err(e) => {
                let violation = SchemaViolation::new(
                    format!("Failed to convert YAML to JSON: {}", e),
                    "conversion error".to_string(),
                    (0, content.len()).into(),
                    None,
                );
                return Err(RecordError::new(filename, content, vec![violation]));
            }
        };

        let violations: Vec<SchemaViolation> = self
            .compiled
            .iter_errors(&json_value)
            .map(|e| error_to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(RecordError::new(filename, content, violations))
        }
    }
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    let field = if path.is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", path)
    };
    let message = match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("Missing required field: {} at {}", prop, field)
        }
        _ => format!("Invalid value at {}: {}", field, format_field_error(error)),
    };
    let hint = format_error_hint(error);
    let help = generate_help_message(error);
    let span = find_path_span(content, &path);

    SchemaViolation::new(message, hint, span, help)
}

/// Generate a short hint for the error label
fn format_error_hint(error: &JsonSchemaError) -> String {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { .. } => "required field missing".to_string(),
        jsonschema::error::ValidationErrorKind::Type { .. } => "wrong type".to_string(),
        jsonschema::error::ValidationErrorKind::Enum { .. } => "invalid value".to_string(),
        jsonschema::error::ValidationErrorKind::Pattern { .. } => "pattern mismatch".to_string(),
        jsonschema::error::ValidationErrorKind::MinLength { .. } => "too short".to_string(),
        jsonschema::error::ValidationErrorKind::MaxLength { .. } => "too long".to_string(),
        jsonschema::error::ValidationErrorKind::AdditionalProperties { .. } => "unknown field".to_string(),
        _ => "validation error".to_string(),
    }
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' field, or re-run `stagecraft event edit`", prop))
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            Some(format!("Valid values: {}", format_enum_options(options)))
        }
        jsonschema::error::ValidationErrorKind::Pattern { pattern } => {
            if pattern.contains("EVT-") {
                Some("ID format: EVT-[26 character ULID], e.g., EVT-01HC2JB7SMQX7RS1Y0GFKBHPTD".to_string())
            } else {
                None
            }
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!("Remove the '{}' field or check spelling", unexpected[0]))
            } else {
                Some("Remove unknown fields or check spelling".to_string())
            }
        }
        _ => None,
    }
}

/// Find the span (byte offset, length) for an error location
fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    let Some(loc) = location else {
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        return (0, len).into();
    };

    let line = loc.line().saturating_sub(1);
    let column = loc.column().saturating_sub(1);

    let mut offset = 0;
    for (i, line_content) in content.lines().enumerate() {
        if i == line {
            offset += column;
            break;
        }
        offset += line_content.len() + 1;
    }

    let rest = &content[offset.min(content.len())..];
    let len = rest.find('\n').unwrap_or(rest.len()).max(1);
    (offset, len).into()
}

/// Find the span for a JSON pointer in YAML content
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();
    let first_line = || -> SourceSpan {
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        (0, len).into()
    };

    let Some(search_key) = parts.last() else {
        return first_line();
    };

    // Array index: point at the parent key instead
    if search_key.parse::<usize>().is_ok() && parts.len() >= 2 {
        if let Some(span) = find_key_span(content, parts[parts.len() - 2]) {
            return span;
        }
    }

    find_key_span(content, search_key).unwrap_or_else(first_line)
}

/// Find the span of a key in YAML content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let search_pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&search_pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, trimmed.len()).into());
        }
        offset += line.len() + 1;
    }
    None
}
