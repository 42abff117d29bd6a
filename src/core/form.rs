//! Form data aggregate shared by every wizard step
//!
//! Values are stored as JSON so that any schema-described field can be
//! carried without the wizard knowing its concrete type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Field-name keyed form values
///
/// Backed by a `BTreeMap` so serialization is always key-sorted, which keeps
/// [`FormData::digest`] stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData {
    values: BTreeMap<String, Value>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build form data from a JSON object, ignoring non-object values
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Self::default(),
        }
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Remove a field, returning its previous value
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_str())
    }

    /// Whether the field holds a usable value
    ///
    /// Absent, `null`, blank strings and empty arrays count as missing.
    /// `false` and `0` are real answers and count as filled.
    pub fn is_filled(&self, field: &str) -> bool {
        match self.values.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Merge another form over this one; the other side wins on conflicts
    pub fn merge(&mut self, other: FormData) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Convert to a JSON object value
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(&self.values).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Split a `key=value` assignment as given on the command line
    ///
    /// Both sides are trimmed; converting the value is left to the caller,
    /// which knows the field's type.
    pub fn split_assignment(input: &str) -> Option<(&str, &str)> {
        let (key, raw) = input.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key, raw.trim()))
    }
}

impl FromIterator<(String, Value)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
