//! Wizard engine.
//!
//! - `state.rs`: framework-free `FormController`
//! - `errors.rs`: field-keyed validation messages
//! - this module: the reactive `WizardService` a wizard component provides
//!   to its steps

pub mod errors;
pub mod state;

use leptos::prelude::*;
use serde_json::Value;
use state::{FormController, SubmitError};
use std::future::Future;

/// Reactive handle over one wizard's [`FormController`]
#[derive(Clone, Copy)]
pub struct WizardService {
    controller: RwSignal<FormController>,
}

impl WizardService {
    pub fn new(controller: FormController) -> Self {
        Self {
            controller: RwSignal::new(controller),
        }
    }

    /// Read from the controller (tracked)
    pub fn with<T>(&self, f: impl FnOnce(&FormController) -> T) -> T {
        self.controller.with(f)
    }

    pub fn current_step(&self) -> usize {
        self.with(FormController::current_step)
    }

    pub fn total_steps(&self) -> usize {
        self.with(FormController::total_steps)
    }

    pub fn is_submitting(&self) -> bool {
        self.with(|c| c.state().is_submitting)
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.with(|c| c.field(name).cloned())
    }

    pub fn field_str(&self, name: &str) -> String {
        self.with(|c| c.field_str(name))
    }

    pub fn show_error(&self, field: &str) -> Option<String> {
        self.with(|c| c.show_error(field).map(str::to_string))
    }

    pub fn next_step(&self) -> bool {
        let mut moved = false;
        self.controller.update(|c| moved = c.next_step());
        moved
    }

    pub fn prev_step(&self) {
        self.controller.update(|c| {
            c.prev_step();
        });
    }

    pub fn go_to_step(&self, step: usize) {
        self.controller.update(|c| {
            c.go_to_step(step);
        });
    }

    pub fn update_field(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.controller.update(|c| c.update_field(name, value));
    }

    pub fn touch_field(&self, name: impl Into<String>) {
        let name = name.into();
        self.controller.update(|c| c.touch_field(name));
    }

    pub fn validate_form(&self) -> bool {
        let mut valid = false;
        self.controller
            .update(|c| valid = c.validate_form().success);
        valid
    }

    pub fn reset_form(&self) {
        self.controller.update(FormController::reset_form);
    }

    /// Validate and hand the payload to `on_submit`.
    ///
    /// The controller is released while the callback runs; when the wizard
    /// is disposed in the meantime the outcome is dropped.
    pub async fn submit<F, Fut>(&self, on_submit: F) -> Result<(), SubmitError>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let data = self
            .controller
            .try_update(FormController::begin_submit)
            .ok_or(SubmitError::Detached)??;

        let outcome = on_submit(data).await;

        match self.controller.try_update(|c| c.finish_submit(outcome)) {
            Some(result) => result,
            None => {
                log::debug!("wizard: disposed before the submission settled");
                Err(SubmitError::Detached)
            }
        }
    }
}

pub fn provide_wizard(controller: FormController) -> WizardService {
    let svc = WizardService::new(controller);
    provide_context(svc);
    svc
}

pub fn use_wizard() -> WizardService {
    use_context::<WizardService>()
        .expect("WizardService not provided in context (mount steps inside a wizard)")
}
