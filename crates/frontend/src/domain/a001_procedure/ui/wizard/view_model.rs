use crate::domain::a001_procedure::api;
use crate::shared::config::WizardConfig;
use crate::shared::modal_stack::state::{ModalRequest, ModalSize};
use crate::shared::modal_stack::ModalContext;
use crate::shared::wizard::state::{FormController, SubmitError, WizardOptions, WizardStep};
use crate::shared::wizard::{provide_wizard, WizardService};
use contracts::domain::a001_procedure::aggregate::{procedure_schema, ProcedureDto};
use leptos::prelude::*;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub fn wizard_steps() -> Vec<WizardStep> {
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

/// Blank process step; `id` only keys the editor rows and is stripped on
/// validation
pub fn new_process_step() -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": "",
        "description": "",
        "required": true
    })
}

pub fn procedure_seed() -> Map<String, Value> {
    let mut seed = Map::new();
    seed.insert("requirements".into(), json!([]));
    seed.insert("steps".into(), json!([new_process_step()]));
    seed
}

fn step_id(step: &Value) -> Option<&str> {
    step.get("id").and_then(Value::as_str)
}

pub fn with_step_removed(steps: &[Value], id: &str) -> Vec<Value> {
    steps
        .iter()
        .filter(|s| step_id(s) != Some(id))
        .cloned()
        .collect()
}

pub fn with_step_field(steps: &[Value], id: &str, key: &str, value: Value) -> Vec<Value> {
    steps
        .iter()
        .map(|s| {
            let mut s = s.clone();
            if step_id(&s) == Some(id) {
                if let Some(obj) = s.as_object_mut() {
                    obj.insert(key.to_string(), value.clone());
                }
            }
            s
        })
        .collect()
}

/// Cost as typed: empty clears it, anything unparsable is kept as text so
/// the schema reports it
pub fn parse_cost(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(cost) => json!(cost),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Review line for a text field; rendered as a text node, so not escaped here
pub fn review_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        "-".to_string()
    } else {
        raw.to_string()
    }
}

/// ViewModel for the procedure creation wizard
#[derive(Clone, Copy)]
pub struct ProcedureWizardViewModel {
    pub wizard: WizardService,
    pub error: RwSignal<Option<String>>,
    pub requirement_draft: RwSignal<String>,
}

impl ProcedureWizardViewModel {
    /// Create the controller and provide it to the step components
    pub fn new(config: &WizardConfig) -> Self {
        let options = WizardOptions::new(wizard_steps())
            .advance(config.advance)
            .jump(config.jump);
        let controller = FormController::with_seed(procedure_schema(), options, procedure_seed());

        Self {
            wizard: provide_wizard(controller),
            error: RwSignal::new(None),
            requirement_draft: RwSignal::new(String::new()),
        }
    }

    fn array(&self, name: &str) -> Vec<Value> {
        self.wizard
            .field(name)
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default()
    }

    pub fn process_steps(&self) -> Vec<Value> {
        self.array("steps")
    }

    pub fn process_step_ids(&self) -> Vec<String> {
        self.process_steps()
            .iter()
            .filter_map(|s| step_id(s).map(str::to_string))
            .collect()
    }

    pub fn process_step_index(&self, id: &str) -> Option<usize> {
        self.process_steps().iter().position(|s| step_id(s) == Some(id))
    }

    pub fn process_step_field(&self, id: &str, key: &str) -> Option<Value> {
        self.process_steps()
            .into_iter()
            .find(|s| step_id(s) == Some(id))
            .and_then(|s| s.get(key).cloned())
    }

    pub fn add_process_step(&self) {
        let mut steps = self.process_steps();
        steps.push(new_process_step());
        self.wizard.update_field("steps", Value::Array(steps));
    }

    pub fn remove_process_step(&self, id: &str) {
        let steps = with_step_removed(&self.process_steps(), id);
        self.wizard.update_field("steps", Value::Array(steps));
    }

    pub fn update_process_step(&self, id: &str, key: &str, value: Value) {
        let steps = with_step_field(&self.process_steps(), id, key, value);
        self.wizard.update_field("steps", Value::Array(steps));
    }

    pub fn requirements(&self) -> Vec<String> {
        self.array("requirements")
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    pub fn add_requirement(&self) {
        let draft = self.requirement_draft.get_untracked();
        if draft.trim().is_empty() {
            return;
        }
        let mut requirements = self.array("requirements");
        requirements.push(Value::String(draft.trim().to_string()));
        self.wizard.update_field("requirements", Value::Array(requirements));
        self.requirement_draft.set(String::new());
    }

    pub fn remove_requirement(&self, index: usize) {
        let mut requirements = self.array("requirements");
        if index < requirements.len() {
            requirements.remove(index);
            self.wizard.update_field("requirements", Value::Array(requirements));
        }
    }

    pub fn next_command(&self) {
        if self.wizard.next_step() {
            self.error.set(None);
        } else {
            self.error
                .set(Some("Veuillez corriger les erreurs avant de continuer".to_string()));
        }
    }

    pub fn prev_command(&self) {
        self.error.set(None);
        self.wizard.prev_step();
    }

    /// Validate, send to the API and close the hosting modal on success
    pub fn submit_command(&self, ctx: ModalContext) {
        let wizard = self.wizard;
        let error = self.error;
        error.set(None);

        wasm_bindgen_futures::spawn_local(async move {
            let result = wizard
                .submit(|data| async move {
                    let dto = ProcedureDto::from_validated(data)?;
                    api::create_procedure(&dto).await
                })
                .await;

            match result {
                Ok(()) => {
                    let mut props = Map::new();
                    props.insert("message".into(), json!("La procédure a été créée avec succès."));
                    props.insert("variant".into(), json!("success"));
                    ctx.svc().open(
                        ModalRequest::new("procedure-created", "alert")
                            .title("Procédure enregistrée")
                            .size(ModalSize::Sm)
                            .priority(10)
                            .props(props),
                    );
                    ctx.close();
                }
                Err(SubmitError::Detached) => {}
                Err(SubmitError::Rejected(reason)) => {
                    let _ = error.try_set(Some(format!("Échec de l'enregistrement : {reason}")));
                }
                Err(e) => {
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
        });
    }

    /// Ask before throwing the form away
    pub fn cancel_command(&self, ctx: &ModalContext) {
        let mut props = Map::new();
        props.insert(
            "message".into(),
            json!("Abandonner la saisie ? Les informations non enregistrées seront perdues."),
        );
        props.insert("confirm_label".into(), json!("Abandonner"));
        props.insert("closes".into(), json!(ctx.id()));
        ctx.svc().open(
            ModalRequest::new("procedure-cancel", "confirmation")
                .title("Confirmation")
                .size(ModalSize::Sm)
                .priority(5)
                .props(props),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Vec<Value> {
        vec![
            json!({ "id": "a", "title": "Dépôt", "description": "", "required": true }),
            json!({ "id": "b", "title": "Retrait", "description": "", "required": false }),
        ]
    }

    #[test]
    fn test_new_process_steps_get_distinct_ids() {
        let first = new_process_step();
        let second = new_process_step();
        assert_ne!(step_id(&first), step_id(&second));
        assert_eq!(first["required"], json!(true));
    }

    #[test]
    fn test_remove_and_edit_by_id() {
        let remaining = with_step_removed(&steps(), "a");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["title"], json!("Retrait"));

        let edited = with_step_field(&steps(), "b", "title", json!("Retrait du permis"));
        assert_eq!(edited[0]["title"], json!("Dépôt"));
        assert_eq!(edited[1]["title"], json!("Retrait du permis"));

        assert_eq!(with_step_removed(&steps(), "zz").len(), 2);
    }

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost(""), Value::Null);
        assert_eq!(parse_cost("1500,5"), json!(1500.5));
        assert_eq!(parse_cost("gratuit"), json!("gratuit"));
    }

    #[test]
    fn test_review_text_is_not_escaped_twice() {
        assert_eq!(review_text("R&D <Alger>"), "R&D <Alger>");
        assert_eq!(review_text("  "), "-");
    }

    #[test]
    fn test_seed_has_one_blank_step() {
        let seed = procedure_seed();
        assert_eq!(seed["steps"].as_array().map(Vec::len), Some(1));
        assert_eq!(seed["requirements"], json!([]));
    }

    #[test]
    fn test_steps_cover_every_schema_field() {
        let owned: Vec<String> = wizard_steps().into_iter().flat_map(|s| s.fields).collect();
        for field in [
            "name",
            "description",
            "category",
            "steps",
            "estimatedDuration",
            "cost",
            "requirements",
            "responsibleOrganization",
        ] {
            assert!(owned.iter().any(|f| f == field), "{field} not on any step");
        }
    }
}
