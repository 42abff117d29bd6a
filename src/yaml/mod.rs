//! YAML reading with source-located diagnostics

pub mod diagnostics;

pub use diagnostics::{Document, YamlError, YamlSyntaxError};

use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a YAML document, mapping syntax and shape errors to a located diagnostic
pub fn parse_yaml<T: DeserializeOwned>(
    content: &str,
    filename: &str,
    document: Document,
) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, content, filename, document).into())
}

/// Read and parse a YAML file
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path, document: Document) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content, &path.display().to_string(), document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::event::Event;
    use miette::Diagnostic;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_yaml_ok() {
        let map: BTreeMap<String, String> =
            parse_yaml("title: Gala\nvenue: Old Hall\n", "form.yaml", Document::Form).unwrap();
        assert_eq!(map["venue"], "Old Hall");
    }

    #[test]
    fn test_parse_yaml_reports_location() {
        let err = parse_yaml::<BTreeMap<String, String>>("title: Gala\n  venue: [", "form.yaml", Document::Form)
            .unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }

    #[test]
    fn test_event_record_error_names_field() {
        let err = parse_yaml::<Event>("title: Gala\n", "EVT-01J9.yaml", Document::EventRecord)
            .unwrap_err();
        let YamlError::Syntax(diag) = err else {
            panic!("expected a syntax diagnostic");
        };
        assert_eq!(diag.document(), Document::EventRecord);
        assert!(diag.to_string().starts_with("invalid event record"));
        assert!(diag.field().is_some());
        assert!(diag.help().is_some());
    }

    #[test]
    fn test_parse_yaml_file_missing() {
        let err = parse_yaml_file::<BTreeMap<String, String>>(Path::new("/nonexistent/form.yaml"), Document::Form)
            .unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
