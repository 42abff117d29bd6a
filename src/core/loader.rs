//! Loading stored event records from the filesystem

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::project::Project;
use crate::entities::event::Event;
use crate::yaml::{parse_yaml_file, Document, YamlError};

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("no event matches '{0}'")]
    #[diagnostic(
        code(stagecraft::store::not_found),
        help("use `stagecraft event list` to see stored ids")
    )]
    NotFound(String),

    #[error("'{id}' matches {} events", matches.len())]
    #[diagnostic(
        code(stagecraft::store::ambiguous),
        help("give more characters of the id")
    )]
    Ambiguous { id: String, matches: Vec<String> },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Every `.yaml` file under `dir`, sorted by path
pub fn record_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "yaml"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Load all records of type T from a directory
///
/// Files that fail to parse are skipped; `stagecraft validate` reports them.
pub fn load_all<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    record_files(dir)
        .into_iter()
        .filter_map(|path| match parse_yaml_file::<T>(&path, Document::EventRecord) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable record");
                None
            }
        })
        .collect()
}

/// Find a record file by full or partial id (case-insensitive)
pub fn find_record_file(dir: &Path, id: &str) -> Result<PathBuf, StoreError> {
    let needle = id.trim().to_uppercase();
    if needle.is_empty() {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let matches: Vec<PathBuf> = record_files(dir)
        .into_iter()
        .filter(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| {
                    let stem = stem.to_uppercase();
                    stem == needle || stem.contains(&needle)
                })
        })
        .collect();

    match matches.as_slice() {
        [] => Err(StoreError::NotFound(id.to_string())),
        [only] => Ok(only.clone()),
        _ => {
            // an exact stem match wins over partial ones
            if let Some(exact) = matches.iter().find(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.eq_ignore_ascii_case(&needle))
            }) {
                return Ok(exact.clone());
            }
            Err(StoreError::Ambiguous {
                id: id.to_string(),
                matches: matches
                    .iter()
                    .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                    .collect(),
            })
        }
    }
}

/// All published and draft events of a project, oldest first
pub fn load_events(project: &Project) -> Vec<Event> {
    let mut events: Vec<Event> = load_all(&project.events_dir());
    events.sort_by(|a, b| a.created.cmp(&b.created));
    events
}

/// Load a single event by full or partial id
pub fn load_event(project: &Project, id: &str) -> Result<(PathBuf, Event), StoreError> {
    let path = find_record_file(&project.events_dir(), id)?;
    let event = parse_yaml_file(&path, Document::EventRecord)?;
    Ok((path, event))
}
