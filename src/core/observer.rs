//! Caller-facing wizard events
//!
//! A host UI implements [`WizardObserver`] to react to step changes,
//! validation failures and submission outcomes.

use crate::schema::validator::FieldErrors;

/// The four observable signals a host must handle
///
/// All methods default to doing nothing so hosts only override what they render.
pub trait WizardObserver {
    fn on_step_change(&mut self, _new_index: usize) {}

    fn on_validation_error(&mut self, _errors: &FieldErrors) {}

    fn on_submit_success(&mut self, _result_id: &str) {}

    fn on_submit_error(&mut self, _reason: &str) {}
}

/// Recorded form of an observer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    StepChanged(usize),
    ValidationFailed(FieldErrors),
    SubmitSucceeded(String),
    SubmitFailed(String),
}

/// Observer that keeps every event, in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<WizardEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[WizardEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&WizardEvent> {
        self.events.last()
    }

    /// Drain recorded events
    pub fn take(&mut self) -> Vec<WizardEvent> {
        std::mem::take(&mut self.events)
    }
}

impl WizardObserver for EventLog {
    fn on_step_change(&mut self, new_index: usize) {
        self.events.push(WizardEvent::StepChanged(new_index));
    }

    fn on_validation_error(&mut self, errors: &FieldErrors) {
        self.events.push(WizardEvent::ValidationFailed(errors.clone()));
    }

    fn on_submit_success(&mut self, result_id: &str) {
        self.events.push(WizardEvent::SubmitSucceeded(result_id.to_string()));
    }

    fn on_submit_error(&mut self, reason: &str) {
        self.events.push(WizardEvent::SubmitFailed(reason.to_string()));
    }
}

/// No-op observer for hosts that poll state instead
impl WizardObserver for () {}
