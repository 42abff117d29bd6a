//! Wizard controller: step sequencing gated on field validation
//!
//! The controller owns the current step index, the set of completed steps
//! and the form data. Forward moves require the current step's fields to
//! validate; backward moves and jumps to completed steps never validate.
//! Every operation is synchronous over in-memory state.

use miette::Diagnostic;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::form::FormData;
use crate::core::observer::WizardObserver;
use crate::core::step::StepDefinition;
use crate::core::store::{Persistence, SubmissionError};
use crate::schema::validator::{FieldErrors, FieldValidator};

/// Errors and signals returned by wizard operations
///
/// None of these leave the wizard in an invalid state.
#[derive(Debug, Error, Diagnostic)]
pub enum WizardError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] FieldErrors),

    /// The caller should treat this as a no-op
    #[error("Step {target} is not accessible from step {current}")]
    #[diagnostic(code(stagecraft::wizard::inaccessible_step))]
    InaccessibleStep { target: usize, current: usize },

    #[error("Submit is only available on the final step (at step {current} of {count})")]
    #[diagnostic(code(stagecraft::wizard::not_terminal))]
    NotAtTerminalStep { current: usize, count: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Submission(#[from] SubmissionError),

    #[error("A wizard needs at least one step")]
    #[diagnostic(code(stagecraft::wizard::no_steps))]
    NoSteps,
}

impl WizardError {
    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            WizardError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_inaccessible(&self) -> bool {
        matches!(self, WizardError::InaccessibleStep { .. })
    }
}

/// Mutable state of one wizard session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    pub current_step: usize,
    pub completed_steps: BTreeSet<usize>,
    pub form_data: FormData,
}

/// Sequences a fixed list of steps over a shared form
pub struct WizardController<O: WizardObserver = ()> {
    steps: Vec<StepDefinition>,
    state: WizardState,
    validator: Box<dyn FieldValidator>,
    observer: O,
}

impl WizardController<()> {
    /// Create a wizard at step 0 with empty form data
    pub fn new(
        steps: Vec<StepDefinition>,
        validator: Box<dyn FieldValidator>,
    ) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        Ok(Self {
            steps,
            state: WizardState::default(),
            validator,
            observer: (),
        })
    }
}

impl<O: WizardObserver> WizardController<O> {
    /// Attach an observer, replacing the current one
    pub fn with_observer<P: WizardObserver>(self, observer: P) -> WizardController<P> {
        WizardController {
            steps: self.steps,
            state: self.state,
            validator: self.validator,
            observer,
        }
    }

    /// Seed the form, e.g. with defaults or a stored record
    pub fn with_form(mut self, form: FormData) -> Self {
        self.state.form_data = form;
        self
    }

    /// Open the wizard at `index` (edit mode)
    ///
    /// Steps before the resume index whose fields currently validate are
    /// marked completed. The index is clamped to the terminal step.
    pub fn resume_at(mut self, index: usize) -> Self {
        let index = index.min(self.last_index());
        for i in 0..index {
            if self.validate_step(i).is_ok() {
                self.state.completed_steps.insert(i);
            }
        }
        self.state.current_step = index;
        debug!(
            step = index,
            completed = self.state.completed_steps.len(),
            "wizard resumed"
        );
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn current(&self) -> &StepDefinition {
        &self.steps[self.state.current_step]
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.current_step == self.last_index()
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.state.completed_steps
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.state.completed_steps.contains(&index)
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn form(&self) -> &FormData {
        &self.state.form_data
    }

    /// Form data is editable at any time, independent of step boundaries
    pub fn form_mut(&mut self) -> &mut FormData {
        &mut self.state.form_data
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Tear down the wizard, keeping only the form
    pub fn into_form_data(self) -> FormData {
        self.state.form_data
    }

    /// Whether `go_to_step(target)` would move without validating
    pub fn can_access(&self, target: usize) -> bool {
        target < self.steps.len()
            && (target <= self.state.current_step || self.state.completed_steps.contains(&target))
    }

    fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    // ------------------------------------------------------------------
    // Validation (pure, fires no events)
    // ------------------------------------------------------------------

    /// Validate one step against the live form
    pub fn validate_step(&self, index: usize) -> Result<(), FieldErrors> {
        let Some(step) = self.steps.get(index) else {
            return Ok(());
        };
        let fields = step.fields_to_check(&self.state.form_data);
        self.validator.validate(&fields, &self.state.form_data)
    }

    /// Validate every step's active and filled fields across the whole form
    pub fn validate_all(&self) -> Result<(), FieldErrors> {
        let mut fields: Vec<String> = Vec::new();
        for step in &self.steps {
            for field in step.fields_to_check(&self.state.form_data) {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        self.validator.validate(&fields, &self.state.form_data)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Validate the current step and advance by one
    ///
    /// On the terminal step a successful validation only marks the step
    /// completed; leaving it is done with [`submit`](Self::submit).
    pub fn go_next(&mut self) -> Result<usize, WizardError> {
        let index = self.state.current_step;

        if let Err(errors) = self.validate_step(index) {
            warn!(
                step = %self.steps[index].id,
                fields = %errors.field_names().join(","),
                "step validation failed"
            );
            self.observer.on_validation_error(&errors);
            return Err(WizardError::Validation(errors));
        }

        self.state.completed_steps.insert(index);
        if index < self.last_index() {
            self.move_to(index + 1);
        }
        Ok(self.state.current_step)
    }

    /// Step back by one, never below 0. Never validates.
    pub fn go_previous(&mut self) -> usize {
        let target = self.state.current_step.saturating_sub(1);
        self.move_to(target);
        target
    }

    /// Jump to a step
    ///
    /// Earlier and completed steps are reached directly; the next step goes
    /// through [`go_next`](Self::go_next); anything else is inaccessible.
    pub fn go_to_step(&mut self, target: usize) -> Result<usize, WizardError> {
        let current = self.state.current_step;

        if self.can_access(target) {
            self.move_to(target);
            return Ok(target);
        }
        if target == current + 1 && target < self.steps.len() {
            return self.go_next();
        }

        debug!(target, current, "inaccessible step requested");
        Err(WizardError::InaccessibleStep { target, current })
    }

    /// Re-validate the whole form and hand it to `store`
    ///
    /// On failure the state is left exactly as it was, so calling `submit`
    /// again retries without re-entering data.
    pub fn submit(&mut self, store: &mut dyn Persistence) -> Result<String, WizardError> {
        if !self.is_terminal() {
            return Err(WizardError::NotAtTerminalStep {
                current: self.state.current_step,
                count: self.steps.len(),
            });
        }

        if let Err(errors) = self.validate_all() {
            warn!(
                fields = %errors.field_names().join(","),
                "submission blocked by validation"
            );
            self.observer.on_validation_error(&errors);
            return Err(WizardError::Validation(errors));
        }

        match store.persist(&self.state.form_data) {
            Ok(id) => {
                self.state.completed_steps.insert(self.state.current_step);
                info!(id = %id, "wizard submission persisted");
                self.observer.on_submit_success(&id);
                Ok(id)
            }
            Err(e) => {
                warn!(reason = %e, "wizard submission failed");
                self.observer.on_submit_error(e.reason());
                Err(WizardError::Submission(e))
            }
        }
    }

    /// Walk forward from the current step to the terminal step
    ///
    /// Stops at the first step that fails validation. Used by headless
    /// hosts that fill the whole form up front.
    pub fn advance_to_end(&mut self) -> Result<usize, WizardError> {
        while !self.is_terminal() {
            self.go_next()?;
        }
        self.go_next()
    }

    fn move_to(&mut self, target: usize) {
        if target == self.state.current_step {
            return;
        }
        debug!(
            from = self.state.current_step,
            to = target,
            step = %self.steps[target].id,
            "wizard step changed"
        );
        self.state.current_step = target;
        self.observer.on_step_change(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::{EventLog, WizardEvent};
    use crate::core::step::Condition;
    use crate::core::store::MemoryStore;
    use crate::schema::validator::{PresenceValidator, SchemaValidator};
    use serde_json::json;

    /// Step 0 needs title, step 1 needs date, step 2 (terminal) needs confirmed = true
    fn three_step_wizard() -> WizardController<EventLog> {
        let steps = vec![
            StepDefinition::new("title").require("title"),
            StepDefinition::new("date").require("date"),
            StepDefinition::new("confirm").require("confirmed"),
        ];
        let schema = json!({ "properties": { "confirmed": { "const": true } } });
        let validator = SchemaValidator::new(&schema).unwrap();
        WizardController::new(steps, Box::new(validator))
            .unwrap()
            .with_observer(EventLog::new())
    }

    #[test]
    fn test_walkthrough_scenario() {
        let mut wizard = three_step_wizard();

        let err = wizard.go_next().unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("title"), Some("required"));
        assert_eq!(wizard.current_step(), 0);
        assert!(wizard.completed_steps().is_empty());

        wizard.form_mut().set("title", "Show");
        assert_eq!(wizard.go_next().unwrap(), 1);
        assert_eq!(wizard.completed_steps().iter().copied().collect::<Vec<_>>(), vec![0]);

        assert_eq!(wizard.go_previous(), 0);
        assert!(wizard.is_completed(0));

        assert_eq!(wizard.go_to_step(1).unwrap(), 1);
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn test_empty_wizard_rejected() {
        assert!(matches!(
            WizardController::new(Vec::new(), Box::new(PresenceValidator)),
            Err(WizardError::NoSteps)
        ));
    }

    #[test]
    fn test_go_next_failure_leaves_state_unchanged() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.go_next().unwrap();
        let before = wizard.state().clone();

        let err = wizard.go_next().unwrap_err();
        assert_eq!(err.field_errors().unwrap().field_names(), vec!["date"]);
        assert_eq!(wizard.state(), &before);
        assert!(matches!(
            wizard.observer().last(),
            Some(WizardEvent::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_confirmed_must_be_true() {
        let mut wizard = three_step_wizard().resume_at(2);
        wizard.form_mut().set("confirmed", false);
        let err = wizard.go_next().unwrap_err();
        assert!(err.field_errors().unwrap().contains("confirmed"));
    }

    #[test]
    fn test_index_never_exceeds_last_step() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.form_mut().set("date", "2026-11-20");
        wizard.form_mut().set("confirmed", true);

        for _ in 0..10 {
            wizard.go_next().unwrap();
        }
        assert_eq!(wizard.current_step(), 2);
        assert!(wizard.is_terminal());
        assert!(wizard.is_completed(2));
    }

    #[test]
    fn test_go_previous_floors_at_zero() {
        let mut wizard = three_step_wizard();
        assert_eq!(wizard.go_previous(), 0);
        assert_eq!(wizard.go_previous(), 0);
        // no movement, no event
        assert!(wizard.observer().events().is_empty());
    }

    #[test]
    fn test_go_to_step_accessibility() {
        let mut wizard = three_step_wizard();

        // two ahead, never completed
        let err = wizard.go_to_step(2).unwrap_err();
        assert!(err.is_inaccessible());
        assert_eq!(wizard.current_step(), 0);

        // out of range
        assert!(wizard.go_to_step(7).unwrap_err().is_inaccessible());

        // next step re-validates
        assert!(matches!(
            wizard.go_to_step(1),
            Err(WizardError::Validation(_))
        ));

        wizard.form_mut().set("title", "Show");
        wizard.form_mut().set("date", "2026-11-20");
        assert_eq!(wizard.go_to_step(1).unwrap(), 1);
        assert_eq!(wizard.go_next().unwrap(), 2);

        // back to start, then jump forward to a completed step
        assert_eq!(wizard.go_to_step(0).unwrap(), 0);
        assert_eq!(wizard.go_to_step(1).unwrap(), 1);
        assert!(!wizard.can_access(2));
    }

    #[test]
    fn test_completed_jump_skips_validation() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.form_mut().set("date", "2026-11-20");
        wizard.go_next().unwrap();
        wizard.go_next().unwrap();
        wizard.go_to_step(0).unwrap();

        // break step 1 after it was completed: jumping there still works
        wizard.form_mut().unset("date");
        assert_eq!(wizard.go_to_step(1).unwrap(), 1);

        // step 2 was never completed, so reaching it re-validates step 1
        assert!(matches!(
            wizard.go_to_step(2),
            Err(WizardError::Validation(_))
        ));
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn test_conditional_field_enforced_when_trigger_flips() {
        let steps = vec![
            StepDefinition::new("highlight")
                .require("highlight_type")
                .require_when(
                    "selection_reasons",
                    Condition::equals("highlight_type", "editor_pick"),
                ),
            StepDefinition::new("publish"),
        ];
        let mut wizard = WizardController::new(steps, Box::new(PresenceValidator)).unwrap();

        wizard.form_mut().set("highlight_type", "featured");
        assert_eq!(wizard.go_next().unwrap(), 1);
        wizard.go_previous();

        wizard.form_mut().set("highlight_type", "editor_pick");
        let err = wizard.go_next().unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().field_names(),
            vec!["selection_reasons"]
        );
        assert_eq!(wizard.current_step(), 0);

        wizard.form_mut().set("selection_reasons", json!(["Rare reunion show"]));
        assert_eq!(wizard.go_next().unwrap(), 1);
    }

    #[test]
    fn test_submit_requires_terminal_step() {
        let mut wizard = three_step_wizard();
        let mut store = MemoryStore::new();
        assert!(matches!(
            wizard.submit(&mut store),
            Err(WizardError::NotAtTerminalStep { current: 0, count: 3 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_submit_revalidates_every_step() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.form_mut().set("date", "2026-11-20");
        wizard.advance_to_end().unwrap_err();
        assert_eq!(wizard.current_step(), 2);

        // title cleared after step 0 was completed
        wizard.form_mut().unset("title");
        let mut store = MemoryStore::new();
        let err = wizard.submit(&mut store).unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().field_names(),
            vec!["confirmed", "title"]
        );
        assert!(store.is_empty());
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn test_failed_submission_leaves_form_identical_and_retries() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.form_mut().set("date", "2026-11-20");
        wizard.form_mut().set("confirmed", true);
        wizard.advance_to_end().unwrap();

        let mut store = MemoryStore::new();
        store.fail_next(1, "backend unavailable");

        let before = serde_json::to_vec(wizard.form()).unwrap();
        let err = wizard.submit(&mut store).unwrap_err();
        assert!(matches!(err, WizardError::Submission(_)));
        assert_eq!(serde_json::to_vec(wizard.form()).unwrap(), before);
        assert!(wizard.is_terminal());

        let id = wizard.submit(&mut store).unwrap();
        assert_eq!(store.get(&id), Some(wizard.form()));

        let events = wizard.observer().events();
        assert!(events.contains(&WizardEvent::SubmitFailed("backend unavailable".to_string())));
        assert_eq!(events.last(), Some(&WizardEvent::SubmitSucceeded(id)));
    }

    #[test]
    fn test_step_change_events() {
        let mut wizard = three_step_wizard();
        wizard.form_mut().set("title", "Show");
        wizard.go_next().unwrap();
        wizard.go_previous();
        assert_eq!(
            wizard.observer().events(),
            &[WizardEvent::StepChanged(1), WizardEvent::StepChanged(0)]
        );
    }

    #[test]
    fn test_resume_marks_passing_steps_completed() {
        let mut form = FormData::new();
        form.set("date", "2026-11-20");

        let wizard = three_step_wizard().with_form(form).resume_at(99);
        assert_eq!(wizard.current_step(), 2);
        // step 0 lacks a title, step 1 passes
        assert!(!wizard.is_completed(0));
        assert!(wizard.is_completed(1));
        assert!(!wizard.is_completed(2));
    }

    fn schedule_wizard() -> WizardController {
        let steps = vec![
            StepDefinition::new("schedule")
                .require("start_date")
                .field("end_date"),
            StepDefinition::new("confirm").require("confirmed"),
        ];
        let schema = json!({
            "properties": {
                "start_date": { "type": "string", "format": "date" },
                "end_date": { "type": "string", "format": "date" },
                "confirmed": { "const": true }
            }
        });
        WizardController::new(steps, Box::new(SchemaValidator::new(&schema).unwrap())).unwrap()
    }

    #[test]
    fn test_filled_optional_field_is_checked() {
        let mut wizard = schedule_wizard();
        wizard.form_mut().set("start_date", "2026-11-14");
        wizard.form_mut().set("end_date", "tomorrow");

        let err = wizard.go_next().unwrap_err();
        let message = err.field_errors().unwrap().get("end_date").unwrap();
        assert!(message.contains("not a valid date"));
        assert_eq!(wizard.current_step(), 0);

        wizard.form_mut().set("end_date", "");
        assert_eq!(wizard.go_next().unwrap(), 1);
    }

    #[test]
    fn test_submit_rechecks_filled_optional_fields() {
        let mut wizard = schedule_wizard();
        wizard.form_mut().set("start_date", "2026-11-14");
        wizard.form_mut().set("confirmed", true);
        assert_eq!(wizard.advance_to_end().unwrap(), 1);

        wizard.form_mut().set("end_date", "2026-13-40");
        let mut store = MemoryStore::new();
        let err = wizard.submit(&mut store).unwrap_err();
        assert!(err.field_errors().unwrap().contains("end_date"));
        assert!(store.is_empty());
    }
}
