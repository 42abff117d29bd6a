//! Schema system: validation, wizard definitions and review rendering

pub mod definition;
pub mod registry;
pub mod template;
pub mod validator;
pub mod wizard;

pub use definition::{DefinitionError, LoadedWizard, WizardDefinition};
pub use registry::SchemaRegistry;
pub use template::{ReviewRenderer, TemplateError};
pub use validator::{
    FieldErrors, FieldValidator, PresenceValidator, RecordValidator, SchemaError, SchemaValidator,
};
pub use wizard::{ConsoleObserver, InteractiveWizard, Outcome};
