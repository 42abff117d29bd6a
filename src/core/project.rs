//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::EventId;

/// Name of the marker directory at the project root
pub const PROJECT_DIR: &str = ".stagecraft";

/// Represents a Stagecraft project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .stagecraft/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::init_force(&root)
    }

    /// Initialize even if .stagecraft/ exists; existing events are kept
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let project = Self { root };

        for dir in [project.wizards_dir(), project.events_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# Stagecraft project configuration

# Author recorded on published events (default: git user.name)
# author: ""

# Wizard used by `stagecraft event new` (built-in: event)
# default_wizard: event

# City pre-filled in new events
# default_city: ""

# Default output format (auto, yaml, json, tsv, csv, md, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .stagecraft configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.yaml")
    }

    /// Directory holding project-specific wizard definitions
    pub fn wizards_dir(&self) -> PathBuf {
        self.config_dir().join("wizards")
    }

    /// Directory holding published event records
    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    /// Get the path for an event record
    pub fn event_path(&self, id: &EventId) -> PathBuf {
        self.events_dir().join(format!("{}.yaml", id))
    }
}

/// Errors that can occur when working with projects
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a stagecraft project (or any parent up to root): {searched_from}\nRun 'stagecraft init' to create one")]
    NotFound { searched_from: PathBuf },

    #[error("project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    IoError(String),
}
