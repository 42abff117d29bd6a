//! Located diagnostics for the YAML documents stagecraft reads
//!
//! A parse failure names the kind of document, the field path serde_yml
//! reports, and a hint that fits that kind of document.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use thiserror::Error;

/// The YAML documents stagecraft reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    /// `wizards/*.yaml`, built in or under `.stagecraft/wizards/`
    Wizard,
    /// A published record under `events/`
    EventRecord,
    /// Field values given with `--data` or `wizard check`
    Form,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Wizard => write!(f, "wizard definition"),
            Document::EventRecord => write!(f, "event record"),
            Document::Form => write!(f, "form file"),
        }
    }
}

/// A YAML document that does not parse into what stagecraft expects
#[derive(Debug, Error, Diagnostic)]
#[error("invalid {document}: {reason}")]
#[diagnostic(code(stagecraft::yaml::invalid_document))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("{}", self.label)]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    document: Document,
    reason: String,
    label: String,
    field: Option<String>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(
        err: &serde_yml::Error,
        source: &str,
        filename: &str,
        document: Document,
    ) -> Self {
        let offset = err
            .location()
            .map(|loc| offset_of(source, loc.line(), loc.column()))
            .unwrap_or(0);

        let message = err.to_string();
        let (path, reason) = split_message(&message);
        let field = match (path, missing_field(reason)) {
            (Some(path), Some(name)) => Some(format!("{}.{}", path, name)),
            (None, Some(name)) => Some(name.to_string()),
            (path, None) => path.map(String::from),
        };
        let label = match &field {
            Some(field) => format!("problem with `{}`", field),
            None => "here".to_string(),
        };

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
            help: hint(document, reason, field.as_deref()),
            document,
            reason: reason.to_string(),
            label,
            field,
        }
    }

    pub fn document(&self) -> Document {
        self.document
    }

    /// Dotted field path, e.g. `steps[1].id` or `category`
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

/// Errors reading a YAML document
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte offset of a 1-based line and column
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let text = source[line_start..].lines().next().unwrap_or("");
    let within = text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    line_start + within
}

/// Split "steps[1]: missing field `id` at line 5 column 5" into the field
/// path and the bare reason
fn split_message(message: &str) -> (Option<&str>, &str) {
    let message = match message.rfind(" at line ") {
        Some(at) => &message[..at],
        None => message,
    };
    match message.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(' ') => (Some(path), reason),
        _ => (None, message),
    }
}

fn missing_field(reason: &str) -> Option<&str> {
    reason
        .strip_prefix("missing field `")?
        .split('`')
        .next()
        .filter(|name| !name.is_empty())
}

fn hint(document: Document, reason: &str, field: Option<&str>) -> Option<String> {
    let reason = reason.to_lowercase();

    if reason.contains("tab") {
        return Some("indent with spaces; YAML does not allow tabs".to_string());
    }
    if reason.contains("mapping values are not allowed") || reason.contains("unexpected ':'") {
        return Some("quote values that contain ':', e.g. venue: \"Hall: East Wing\"".to_string());
    }
    if reason.contains("duplicate") {
        return Some("each key may appear only once".to_string());
    }

    match document {
        Document::Wizard => {
            if reason.contains("unknown variant") {
                return Some("conditions use `op: equals`, `op: one_of` or `op: present`".to_string());
            }
            let missing = missing_field(&reason)?;
            Some(match missing {
                "id" => "every step needs an `id`".to_string(),
                "field" | "when" => {
                    "a conditional rule needs `field` and `when`, e.g.\n  - field: price\n    when: { op: equals, field: ticketing, value: paid }"
                        .to_string()
                }
                _ => "a wizard needs `name`, `schema` and `steps`".to_string(),
            })
        }
        Document::EventRecord => {
            if reason.contains("unknown variant") {
                let name = field.unwrap_or("this field");
                return Some(format!(
                    "`stagecraft schema event.record` lists the allowed values for {}",
                    name
                ));
            }
            if missing_field(&reason).is_some() || reason.contains("invalid") {
                return Some(
                    "records are written by the wizard; fix the value with `stagecraft event edit`"
                        .to_string(),
                );
            }
            None
        }
        Document::Form => Some("a form file is a mapping of field names to values".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Debug, Deserialize)]
    struct Step {
        id: String,
    }

    #[allow(dead_code)]
    #[derive(Debug, Deserialize)]
    struct Wizard {
        name: String,
        steps: Vec<Step>,
    }

    #[test]
    fn test_offset_of() {
        let source = "title: Gala\nvenue: Théâtre\ncity: Lyon";
        assert_eq!(offset_of(source, 1, 1), 0);
        assert_eq!(offset_of(source, 2, 1), 12);
        assert_eq!(offset_of(source, 3, 7), source.find("Lyon").unwrap());
        assert_eq!(offset_of(source, 9, 1), source.len());
    }

    #[test]
    fn test_split_message() {
        assert_eq!(
            split_message("steps[1]: missing field `id` at line 5 column 5"),
            (Some("steps[1]"), "missing field `id`")
        );
        assert_eq!(
            split_message("missing field `venue` at line 1 column 1"),
            (None, "missing field `venue`")
        );
        assert_eq!(
            split_message("did not find expected key: bad indent"),
            (None, "did not find expected key: bad indent")
        );
    }

    #[test]
    fn test_wizard_error_names_step_field() {
        let source = "name: quick\nsteps:\n  - id: all\n  - title: Publish\n";
        let err = serde_yml::from_str::<Wizard>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "quick.yaml", Document::Wizard);

        assert_eq!(diag.document(), Document::Wizard);
        assert!(diag.field().unwrap().ends_with("id"));
        assert!(diag.to_string().starts_with("invalid wizard definition"));
        assert_eq!(diag.help.as_deref(), Some("every step needs an `id`"));
    }

    #[test]
    fn test_hints_follow_document_kind() {
        assert!(hint(Document::Wizard, "unknown variant `greater`", None)
            .unwrap()
            .contains("op: equals"));
        assert!(hint(Document::EventRecord, "unknown variant `rave`", Some("category"))
            .unwrap()
            .contains("category"));
        assert!(hint(Document::Form, "invalid type: sequence", None).is_some());
        assert!(hint(Document::EventRecord, "something else", None).is_none());
        assert!(hint(Document::Wizard, "found tab character", None)
            .unwrap()
            .contains("spaces"));
    }
}
