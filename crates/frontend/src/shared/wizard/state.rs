//! Multi-step form controller.
//!
//! Owns the step index, the partially filled form data, touched fields and the
//! submission lifecycle. Validation always runs the full schema over the whole
//! form; steps only decide which errors block navigation.

use contracts::shared::schema::{Schema, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::future::Future;
use thiserror::Error;

use super::errors::FieldErrors;

/// What `next_step` checks before moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Always advance while a next step exists
    #[default]
    Free,
    /// Stay on the step while any of its fields has an error
    RequireValidStep,
}

/// How `go_to_step` treats its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpPolicy {
    /// Targets outside `1..=total_steps` are ignored
    #[default]
    WithinBounds,
    /// Any target is accepted, the caller keeps it in range
    Unchecked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardStep {
    pub title: String,
    /// Top-level fields edited on this step
    pub fields: Vec<String>,
}

impl WizardStep {
    pub fn new<I, S>(title: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardOptions {
    pub steps: Vec<WizardStep>,
    pub advance: AdvancePolicy,
    pub jump: JumpPolicy,
}

impl WizardOptions {
    pub fn new(steps: Vec<WizardStep>) -> Self {
        Self {
            steps,
            advance: AdvancePolicy::default(),
            jump: JumpPolicy::default(),
        }
    }

    pub fn advance(mut self, advance: AdvancePolicy) -> Self {
        self.advance = advance;
        self
    }

    pub fn jump(mut self, jump: JumpPolicy) -> Self {
        self.jump = jump;
        self
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    /// 1-based
    pub current_step: usize,
    pub form_data: Map<String, Value>,
    pub errors: FieldErrors,
    pub touched_fields: BTreeSet<String>,
    pub is_submitting: bool,
    pub is_valid: bool,
    pub submit_attempts: u32,
}

impl FormState {
    fn from_seed(seed: &Map<String, Value>) -> Self {
        Self {
            current_step: 1,
            form_data: seed.clone(),
            errors: FieldErrors::new(),
            touched_fields: BTreeSet::new(),
            is_submitting: false,
            is_valid: false,
            submit_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("le formulaire contient {0} erreur(s)")]
    Invalid(usize),
    #[error("soumission refusée : {0}")]
    Rejected(String),
    #[error("une soumission est déjà en cours")]
    InFlight,
    #[error("le formulaire a été fermé avant la fin de la soumission")]
    Detached,
}

#[derive(Debug, Clone)]
pub struct FormController {
    schema: Schema,
    options: WizardOptions,
    seed: Map<String, Value>,
    state: FormState,
}

impl FormController {
    pub fn new(schema: impl Into<Schema>, options: WizardOptions) -> Self {
        Self::with_seed(schema, options, Map::new())
    }

    /// Controller whose form starts from (and resets to) `seed`
    pub fn with_seed(
        schema: impl Into<Schema>,
        options: WizardOptions,
        seed: Map<String, Value>,
    ) -> Self {
        let state = FormState::from_seed(&seed);
        Self {
            schema: schema.into(),
            options,
            seed,
            state,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.options.total_steps()
    }

    pub fn is_first_step(&self) -> bool {
        self.state.current_step <= 1
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step >= self.total_steps()
    }

    pub fn step(&self, number: usize) -> Option<&WizardStep> {
        number.checked_sub(1).and_then(|i| self.options.steps.get(i))
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.state.form_data.get(name)
    }

    pub fn field_str(&self, name: &str) -> String {
        self.field(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn next_step(&mut self) -> bool {
        if self.state.current_step >= self.total_steps() {
            return false;
        }

        if self.options.advance == AdvancePolicy::RequireValidStep {
            self.validate_form();
            let step = self.state.current_step;
            if self.step_has_errors(step) {
                // surface the blocking errors even on untouched fields
                let fields = self.step(step).map(|s| s.fields.clone()).unwrap_or_default();
                self.state.touched_fields.extend(fields);
                log::warn!("wizard: step {step} has errors, staying");
                return false;
            }
        }

        self.state.current_step += 1;
        log::debug!("wizard: step {}", self.state.current_step);
        true
    }

    pub fn prev_step(&mut self) -> bool {
        if self.state.current_step <= 1 {
            return false;
        }
        self.state.current_step -= 1;
        log::debug!("wizard: step {}", self.state.current_step);
        true
    }

    pub fn go_to_step(&mut self, step: usize) -> bool {
        let in_bounds = (1..=self.total_steps()).contains(&step);
        if !in_bounds && self.options.jump == JumpPolicy::WithinBounds {
            log::debug!("wizard: ignoring jump to step {step}");
            return false;
        }
        self.state.current_step = step;
        log::debug!("wizard: jumped to step {step}");
        true
    }

    pub fn update_field(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.state.touched_fields.insert(name.clone());
        self.state.form_data.insert(name, value);
    }

    pub fn update_fields(&mut self, partial: Map<String, Value>) {
        for (name, value) in partial {
            self.update_field(name, value);
        }
    }

    pub fn touch_field(&mut self, name: impl Into<String>) {
        self.state.touched_fields.insert(name.into());
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.state.touched_fields.contains(name)
    }

    /// Run the schema over the whole form and record the outcome
    pub fn validate_form(&mut self) -> Validation {
        let validation = self.schema.validate(&Value::Object(self.state.form_data.clone()));
        self.state.errors = FieldErrors::from_issues(&validation.errors);
        self.state.is_valid = validation.success;
        validation
    }

    /// Error to display for `field`: only once the user touched it or tried
    /// to submit
    pub fn show_error(&self, field: &str) -> Option<&str> {
        let root = field.split('.').next().unwrap_or(field);
        let visible = self.state.submit_attempts > 0 || self.is_touched(root);
        if visible {
            self.state.errors.get(field)
        } else {
            None
        }
    }

    pub fn step_has_errors(&self, step: usize) -> bool {
        self.step(step)
            .map(|s| s.fields.iter().any(|f| self.state.errors.has_errors_under(f)))
            .unwrap_or(false)
    }

    pub fn reset_form(&mut self) {
        self.state = FormState::from_seed(&self.seed);
        log::debug!("wizard: form reset");
    }

    /// Start a submission: returns the validated payload to hand to the
    /// backend, or why nothing should be sent.
    pub fn begin_submit(&mut self) -> Result<Value, SubmitError> {
        if self.state.is_submitting {
            log::warn!("wizard: submit ignored, one is already in flight");
            return Err(SubmitError::InFlight);
        }

        self.state.is_submitting = true;
        self.state.submit_attempts += 1;

        let validation = self.validate_form();
        match validation.data {
            Some(data) if validation.success => {
                log::info!("wizard: submitting (attempt {})", self.state.submit_attempts);
                Ok(data)
            }
            _ => {
                self.state.is_submitting = false;
                log::warn!(
                    "wizard: submit blocked by {} validation error(s)",
                    self.state.errors.len()
                );
                Err(SubmitError::Invalid(self.state.errors.len()))
            }
        }
    }

    /// Settle a submission started with [`Self::begin_submit`]
    pub fn finish_submit(&mut self, outcome: Result<(), String>) -> Result<(), SubmitError> {
        self.state.is_submitting = false;
        match outcome {
            Ok(()) => {
                log::info!("wizard: submission accepted");
                self.reset_form();
                Ok(())
            }
            Err(reason) => {
                log::error!("wizard: submission rejected: {reason}");
                Err(SubmitError::Rejected(reason))
            }
        }
    }

    pub async fn submit_form<F, Fut>(&mut self, on_submit: F) -> Result<(), SubmitError>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let data = self.begin_submit()?;
        let outcome = on_submit(data).await;
        self.finish_submit(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_procedure::aggregate::procedure_schema;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn procedure_steps() -> Vec<WizardStep> {
        vec![
            WizardStep::new("Informations générales", ["name", "description", "category"]),
            WizardStep::new(
                "Prérequis",
                ["requirements", "responsibleOrganization", "estimatedDuration", "cost"],
            ),
            WizardStep::new("Étapes du processus", ["steps"]),
            WizardStep::new("Révision", Vec::<String>::new()),
        ]
    }

    fn controller() -> FormController {
        FormController::new(procedure_schema(), WizardOptions::new(procedure_steps()))
    }

    fn permit_request(controller: &mut FormController) {
        let partial = json!({
            "name": "Demande de permis",
            "description": "Procédure de demande de permis de construire",
            "category": "Urbanisme",
            "requirements": ["Pièce d'identité"],
            "responsibleOrganization": "APC",
            "estimatedDuration": "1 mois",
            "steps": [{
                "id": "tmp-1",
                "title": "Dépôt du dossier",
                "description": "Déposer le dossier complet",
                "required": true
            }]
        });
        controller.update_fields(partial.as_object().cloned().unwrap());
    }

    #[test]
    fn test_step_bounds() {
        let mut c = controller();
        assert!(!c.prev_step());
        assert_eq!(c.current_step(), 1);

        for _ in 0..10 {
            c.next_step();
        }
        assert_eq!(c.current_step(), 4);
        assert!(c.is_last_step());

        assert!(!c.go_to_step(0));
        assert!(!c.go_to_step(5));
        assert_eq!(c.current_step(), 4);
        assert!(c.go_to_step(2));
        assert_eq!(c.current_step(), 2);
    }

    #[test]
    fn test_unchecked_jump_trusts_caller() {
        let options = WizardOptions::new(procedure_steps()).jump(JumpPolicy::Unchecked);
        let mut c = FormController::new(procedure_schema(), options);
        assert!(c.go_to_step(7));
        assert_eq!(c.current_step(), 7);
    }

    #[test]
    fn test_require_valid_step_blocks_on_own_errors() {
        let options = WizardOptions::new(procedure_steps()).advance(AdvancePolicy::RequireValidStep);
        let mut c = FormController::new(procedure_schema(), options);

        assert!(!c.next_step());
        assert_eq!(c.current_step(), 1);
        // blocked fields become visible
        assert!(c.show_error("name").is_some());

        c.update_field("name", json!("Demande de permis"));
        c.update_field(
            "description",
            json!("Procédure de demande de permis de construire"),
        );
        // later steps still have errors, step 1 does not
        assert!(c.next_step());
        assert_eq!(c.current_step(), 2);
        assert!(!c.state().is_valid);
    }

    #[test]
    fn test_validation_is_exhaustive() {
        let mut c = controller();
        c.update_field("name", json!("abc"));
        c.update_field("description", json!("trop court"));
        c.update_field("cost", json!(-5));

        let validation = c.validate_form();
        assert!(!validation.success);
        assert!(!c.state().is_valid);
        // name, description, cost, steps, estimatedDuration, requirements,
        // responsibleOrganization
        assert_eq!(validation.errors.len(), 7);
        assert_eq!(c.state().errors.len(), 7);
        assert_eq!(
            c.state().errors.get("name"),
            Some("Le nom doit contenir au moins 5 caractères")
        );
    }

    #[test]
    fn test_error_visibility_follows_touch_and_submit() {
        let mut c = controller();
        c.update_field("name", json!("abc"));
        c.validate_form();

        assert!(c.show_error("name").is_some());
        assert!(c.show_error("description").is_none());

        let blocked = c.begin_submit();
        assert!(matches!(blocked, Err(SubmitError::Invalid(_))));
        assert_eq!(c.state().submit_attempts, 1);
        assert!(c.show_error("description").is_some());
        assert!(!c.state().is_submitting);
    }

    #[test]
    fn test_reset_restores_seed() {
        let seed = json!({ "cost": 0 }).as_object().cloned().unwrap();
        let mut c = FormController::with_seed(
            procedure_schema(),
            WizardOptions::new(procedure_steps()),
            seed.clone(),
        );
        c.update_field("name", json!("Demande"));
        c.next_step();
        c.validate_form();

        c.reset_form();
        assert_eq!(c.state().form_data, seed);
        assert_eq!(c.current_step(), 1);
        assert!(c.state().errors.is_empty());
        assert!(c.state().touched_fields.is_empty());
    }

    #[test]
    fn test_second_submit_while_in_flight_is_refused() {
        let mut c = controller();
        permit_request(&mut c);

        assert!(c.begin_submit().is_ok());
        assert_eq!(c.begin_submit(), Err(SubmitError::InFlight));
        assert!(c.state().is_submitting);

        assert_eq!(c.finish_submit(Ok(())), Ok(()));
        assert!(!c.state().is_submitting);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_callback() {
        let mut c = controller();
        let calls = Rc::new(RefCell::new(0));

        let result = c
            .submit_form({
                let calls = calls.clone();
                move |_| async move {
                    *calls.borrow_mut() += 1;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(SubmitError::Invalid(n)) if n > 0));
        assert_eq!(*calls.borrow(), 0);
        assert!(!c.state().is_submitting);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_data_and_allows_retry() {
        let mut c = controller();
        permit_request(&mut c);
        let before = c.state().form_data.clone();

        let failed = c
            .submit_form(|_| async { Err("Service indisponible".to_string()) })
            .await;
        assert_eq!(
            failed,
            Err(SubmitError::Rejected("Service indisponible".into()))
        );
        assert!(!c.state().is_submitting);
        assert_eq!(c.state().form_data, before);

        let retried = c.submit_form(|_| async { Ok(()) }).await;
        assert_eq!(retried, Ok(()));
        assert!(c.state().form_data.is_empty());
        assert_eq!(c.current_step(), 1);
    }

    #[tokio::test]
    async fn test_procedure_submission_sanitizes_and_drops_row_ids() {
        let options = WizardOptions::new(procedure_steps()).advance(AdvancePolicy::RequireValidStep);
        let mut c = FormController::new(procedure_schema(), options);
        c.update_field("name", json!("Demande de permis"));
        c.update_field(
            "description",
            json!("<p>Procédure de demande de permis de construire</p><script>x()</script>"),
        );
        assert!(c.next_step());

        c.update_field("requirements", json!(["Pièce d'identité"]));
        c.update_field("responsibleOrganization", json!("APC"));
        c.update_field("estimatedDuration", json!("1 mois"));
        assert!(c.next_step());

        c.update_field(
            "steps",
            json!([{ "id": "tmp-1", "title": "Dépôt", "description": "", "required": true }]),
        );
        assert!(c.next_step());
        assert_eq!(c.current_step(), 4);

        let received = Rc::new(RefCell::new(Vec::new()));
        let result = c
            .submit_form({
                let received = received.clone();
                move |data| async move {
                    received.borrow_mut().push(data);
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Ok(()));
        let received = received.borrow();
        assert_eq!(received.len(), 1);
        let payload = &received[0];
        assert_eq!(
            payload["description"],
            json!("<p>Procédure de demande de permis de construire</p>")
        );
        // temporary ids are not part of the payload
        assert!(payload["steps"][0].get("id").is_none());
        assert_eq!(payload["steps"][0]["title"], json!("Dépôt"));
        assert!(c.state().form_data.is_empty());
    }

    #[tokio::test]
    async fn test_permit_request_from_empty_seed_submits_once() {
        let schema: Schema = Schema::object()
            .field("name", Schema::string().min_length(5, "Nom trop court"))
            .field(
                "requirements",
                Schema::array(Schema::string()).min_items(1, "Au moins un prérequis"),
            )
            .into();
        let steps = vec![
            WizardStep::new("Informations générales", ["name"]),
            WizardStep::new("Prérequis", ["requirements"]),
            WizardStep::new("Étapes", Vec::<String>::new()),
            WizardStep::new("Révision", Vec::<String>::new()),
        ];
        let mut c = FormController::with_seed(schema, WizardOptions::new(steps), Map::new());

        c.update_field("name", json!("Demande de permis"));
        assert!(c.next_step());
        c.update_field("requirements", json!(["Pièce d'identité"]));

        let received = Rc::new(RefCell::new(Vec::new()));
        let result = c
            .submit_form({
                let received = received.clone();
                move |data| async move {
                    received.borrow_mut().push(data);
                    Ok(())
                }
            })
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(
            *received.borrow(),
            vec![json!({ "name": "Demande de permis", "requirements": ["Pièce d'identité"] })]
        );
    }
}
