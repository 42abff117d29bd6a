//! Embedded JSON Schemas and built-in wizard definitions

use rust_embed::Embed;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

#[derive(Embed)]
#[folder = "wizards/"]
struct EmbeddedWizards;

const SCHEMA_SUFFIX: &str = ".schema.json";
const WIZARD_SUFFIX: &str = ".yaml";

/// Lookup for schemas and wizard definitions compiled into the binary
///
/// Schemas are keyed by file stem without `.schema.json` (`event.form`),
/// wizards by stem without `.yaml` (`event`).
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, String>,
    wizards: BTreeMap<String, String>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            schemas: collect::<EmbeddedSchemas>(SCHEMA_SUFFIX),
            wizards: collect::<EmbeddedWizards>(WIZARD_SUFFIX),
        }
    }
}

fn collect<E: Embed>(suffix: &str) -> BTreeMap<String, String> {
    E::iter()
        .filter_map(|file| {
            let name = file.strip_suffix(suffix)?.to_string();
            let content = E::get(&file)?;
            let text = std::str::from_utf8(&content.data).ok()?.to_string();
            Some((name, text))
        })
        .collect()
}

impl SchemaRegistry {
    /// Raw schema text
    pub fn get(&self, name: &str) -> Option<&str> {
        self.schemas.get(name).map(String::as_str)
    }

    /// Parsed schema
    pub fn get_json(&self, name: &str) -> Option<Value> {
        self.get(name).and_then(|s| serde_json::from_str(s).ok())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Raw YAML of a built-in wizard definition
    pub fn wizard_source(&self, name: &str) -> Option<&str> {
        self.wizards.get(name).map(String::as_str)
    }

    pub fn wizard_names(&self) -> impl Iterator<Item = &str> {
        self.wizards.keys().map(String::as_str)
    }
}
