//! Core module - the wizard controller and its collaborators

pub mod config;
pub mod form;
pub mod identity;
pub mod loader;
pub mod logging;
pub mod observer;
pub mod project;
pub mod step;
pub mod store;
pub mod wizard;

pub use config::Config;
pub use form::FormData;
pub use identity::{EventId, IdParseError};
pub use loader::StoreError;
pub use observer::{EventLog, WizardEvent, WizardObserver};
pub use project::{Project, ProjectError};
pub use step::{Condition, ConditionalRule, StepDefinition};
pub use store::{MemoryStore, Persistence, ProjectStore, SubmissionError};
pub use wizard::{WizardController, WizardError, WizardState};
