//! Persistence collaborators for completed wizard forms

use chrono::Utc;
use miette::Diagnostic;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::core::form::FormData;
use crate::core::identity::EventId;
use crate::core::project::Project;
use crate::entities::event::{Event, EventStatus};

/// The persistence collaborator reported a failure
///
/// The reason is surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("Submission failed: {reason}")]
#[diagnostic(
    code(stagecraft::store::submission_failed),
    help("your answers are kept; publish again to retry")
)]
pub struct SubmissionError {
    reason: String,
}

impl SubmissionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Receives the complete form when a wizard is submitted
pub trait Persistence {
    /// Store the form, returning an identifier for the stored record
    fn persist(&mut self, form: &FormData) -> Result<String, SubmissionError>;
}

/// Keeps submitted forms in memory
///
/// Can be told to fail a number of upcoming calls, which is how dry runs
/// and tests exercise the retry path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, FormData>,
    failures_left: usize,
    failure_reason: String,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls with `reason`
    pub fn fail_next(&mut self, count: usize, reason: impl Into<String>) {
        self.failures_left = count;
        self.failure_reason = reason.into();
    }

    pub fn get(&self, id: &str) -> Option<&FormData> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Persistence for MemoryStore {
    fn persist(&mut self, form: &FormData) -> Result<String, SubmissionError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SubmissionError::new(self.failure_reason.clone()));
        }
        self.next_id += 1;
        let id = format!("MEM-{}", self.next_id);
        self.records.insert(id.clone(), form.clone());
        Ok(id)
    }
}

/// Writes published events as YAML files under `events/`
pub struct ProjectStore<'a> {
    project: &'a Project,
    author: String,
    editing: Option<Event>,
}

impl<'a> ProjectStore<'a> {
    /// Store for new events
    pub fn new(project: &'a Project, author: impl Into<String>) -> Self {
        Self {
            project,
            author: author.into(),
            editing: None,
        }
    }

    /// Store that overwrites `existing`, keeping its id, author and creation time
    pub fn editing(project: &'a Project, existing: Event) -> Self {
        Self {
            project,
            author: existing.author.clone(),
            editing: Some(existing),
        }
    }

    fn build_event(&self, form: &FormData) -> Result<Event, SubmissionError> {
        let (id, created) = match &self.editing {
            Some(existing) => (existing.id, existing.created),
            None => (EventId::new(), Utc::now()),
        };

        let mut event = Event::from_form(id, form, &self.author, created)
            .map_err(|e| SubmissionError::new(format!("form cannot be stored: {}", e)))?;
        event.status = EventStatus::Published;
        if self.editing.is_some() {
            event.updated = Some(Utc::now());
        }
        Ok(event)
    }
}

impl Persistence for ProjectStore<'_> {
    fn persist(&mut self, form: &FormData) -> Result<String, SubmissionError> {
        let event = self.build_event(form)?;
        let yaml = serde_yml::to_string(&event)
            .map_err(|e| SubmissionError::new(format!("cannot serialize event: {}", e)))?;

        let dir = self.project.events_dir();
        std::fs::create_dir_all(&dir)
            .map_err(|e| SubmissionError::new(format!("cannot create {}: {}", dir.display(), e)))?;

        let path = self.project.event_path(&event.id);
        std::fs::write(&path, yaml)
            .map_err(|e| SubmissionError::new(format!("cannot write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "event written");
        Ok(event.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn complete_form() -> FormData {
        FormData::from_json(json!({
            "title": "Night of Strings",
            "category": "concert",
            "start_date": "2026-11-20",
            "venue": "Old Hall",
            "artists": ["Quartet Nova"],
            "ticketing": "free",
            "highlight_type": "none",
            "confirmed": true
        }))
    }

    #[test]
    fn test_memory_store_fail_then_succeed() {
        let mut store = MemoryStore::new();
        store.fail_next(2, "offline");

        assert_eq!(store.persist(&complete_form()).unwrap_err().reason(), "offline");
        assert!(store.persist(&complete_form()).is_err());
        let id = store.persist(&complete_form()).unwrap();
        assert_eq!(id, "MEM-1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_project_store_writes_published_event() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let mut store = ProjectStore::new(&project, "Ada");

        let id = store.persist(&complete_form()).unwrap();
        let path = project.event_path(&EventId::parse(&id).unwrap());
        let content = std::fs::read_to_string(path).unwrap();

        assert!(content.contains("title: Night of Strings"));
        assert!(content.contains("status: published"));
        assert!(content.contains("author: Ada"));
        assert!(!content.contains("confirmed"));
    }

    #[test]
    fn test_project_store_editing_keeps_identity() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let id = ProjectStore::new(&project, "Ada")
            .persist(&complete_form())
            .unwrap();
        let path = project.event_path(&EventId::parse(&id).unwrap());
        let original: Event = serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        let mut form = original.to_form();
        form.set("title", "Night of Strings (late show)");
        let mut store = ProjectStore::editing(&project, original.clone());
        let edited_id = store.persist(&form).unwrap();

        assert_eq!(edited_id, id);
        let edited: Event = serde_yml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(edited.title, "Night of Strings (late show)");
        assert_eq!(edited.created, original.created);
        assert_eq!(edited.author, "Ada");
        assert!(edited.updated.is_some());
    }

    #[test]
    fn test_project_store_rejects_unconvertible_form() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let mut form = complete_form();
        form.set("start_date", "next friday");

        let err = ProjectStore::new(&project, "Ada").persist(&form).unwrap_err();
        assert!(err.reason().starts_with("form cannot be stored"));
    }
}
