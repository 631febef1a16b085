use super::view_model::{parse_cost, review_text, ProcedureWizardViewModel};
use crate::shared::components::ui::{Button, Checkbox, Input, Select, Textarea};
use crate::shared::icons::icon;
use crate::shared::security::sanitize_user_input;
use crate::shared::wizard::{use_wizard, WizardService};
use contracts::domain::a001_procedure::aggregate::{
    DURATION_OPTIONS, ORGANIZATIONS, PROCEDURE_CATEGORIES,
};
use contracts::shared::sanitize::SanitizeMode;
use leptos::prelude::*;
use serde_json::Value;

fn options(values: &[&str]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|v| (v.to_string(), v.to_string()))
        .collect()
}

fn text(wizard: WizardService, name: &'static str) -> Signal<String> {
    Signal::derive(move || wizard.field_str(name))
}

fn set_text(wizard: WizardService, name: &'static str) -> Callback<String> {
    Callback::new(move |value: String| wizard.update_field(name, Value::String(value)))
}

/// Empty selection clears the field
fn set_choice(wizard: WizardService, name: &'static str) -> Callback<String> {
    Callback::new(move |value: String| {
        let value = if value.is_empty() {
            Value::Null
        } else {
            Value::String(value)
        };
        wizard.update_field(name, value)
    })
}

fn touch(wizard: WizardService, name: &'static str) -> Callback<()> {
    Callback::new(move |_| wizard.touch_field(name))
}

fn error(wizard: WizardService, path: &'static str) -> Signal<Option<String>> {
    Signal::derive(move || wizard.show_error(path))
}

#[component]
pub fn GeneralStep() -> impl IntoView {
    let wizard = use_wizard();

    view! {
        <div class="wizard__step">
            <Input
                id="procedure-name"
                label="Nom de la procédure"
                required=true
                placeholder="Ex : Demande de permis de construire"
                value=text(wizard, "name")
                on_input=set_text(wizard, "name")
                on_blur=touch(wizard, "name")
                error=error(wizard, "name")
            />
            <Textarea
                id="procedure-description"
                label="Description"
                required=true
                rows=5
                placeholder="Décrivez l'objet et le déroulement de la procédure"
                value=text(wizard, "description")
                on_input=set_text(wizard, "description")
                on_blur=touch(wizard, "description")
                error=error(wizard, "description")
            />
            <Select
                id="procedure-category"
                label="Catégorie"
                placeholder="Sélectionner une catégorie"
                options=options(PROCEDURE_CATEGORIES)
                value=text(wizard, "category")
                on_change=set_choice(wizard, "category")
                error=error(wizard, "category")
            />
        </div>
    }
}

#[component]
pub fn RequirementsStep(vm: ProcedureWizardViewModel) -> impl IntoView {
    let wizard = use_wizard();
    let cost_text = Signal::derive(move || match wizard.field("cost") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        _ => String::new(),
    });

    view! {
        <div class="wizard__step">
            <div class="form__group">
                <label class="form__label">"Documents et conditions requis"</label>
                <ul class="wizard__list">
                    {move || {
                        vm.requirements()
                            .into_iter()
                            .enumerate()
                            .map(|(index, requirement)| view! {
                                <li class="wizard__list-item">
                                    <span>{requirement}</span>
                                    <button
                                        class="button button--ghost button--icon"
                                        aria-label="Retirer"
                                        on:click=move |_| vm.remove_requirement(index)
                                    >
                                        {icon("trash")}
                                    </button>
                                </li>
                            })
                            .collect_view()
                    }}
                </ul>
                <div class="wizard__inline">
                    <Input
                        id="procedure-requirement"
                        placeholder="Ex : Copie de la pièce d'identité"
                        value=vm.requirement_draft
                        on_input=Callback::new(move |v: String| vm.requirement_draft.set(v))
                    />
                    <Button variant="secondary" on_click=Callback::new(move |_| vm.add_requirement())>
                        {icon("plus")}
                        "Ajouter"
                    </Button>
                </div>
            </div>
            <Select
                id="procedure-organization"
                label="Organisme responsable"
                required=true
                placeholder="Sélectionner un organisme"
                options=options(ORGANIZATIONS)
                value=text(wizard, "responsibleOrganization")
                on_change=set_choice(wizard, "responsibleOrganization")
                error=error(wizard, "responsibleOrganization")
            />
            <Select
                id="procedure-duration"
                label="Durée estimée"
                required=true
                placeholder="Sélectionner une durée"
                options=options(DURATION_OPTIONS)
                value=text(wizard, "estimatedDuration")
                on_change=set_choice(wizard, "estimatedDuration")
                error=error(wizard, "estimatedDuration")
            />
            <Input
                id="procedure-cost"
                label="Coût (DA)"
                input_type="number"
                placeholder="0"
                value=cost_text
                on_input=Callback::new(move |raw: String| wizard.update_field("cost", parse_cost(&raw)))
                on_blur=touch(wizard, "cost")
                error=error(wizard, "cost")
            />
        </div>
    }
}

#[component]
pub fn ProcessStep(vm: ProcedureWizardViewModel) -> impl IntoView {
    let wizard = use_wizard();

    view! {
        <div class="wizard__step">
            {move || wizard.show_error("steps").map(|e| view! { <p class="form__error">{e}</p> })}
            <For
                each=move || vm.process_step_ids()
                key=|id| id.clone()
                children=move |id| view! { <ProcessStepRow vm=vm id=id/> }
            />
            <Button variant="secondary" on_click=Callback::new(move |_| vm.add_process_step())>
                {icon("plus")}
                "Ajouter une étape"
            </Button>
        </div>
    }
}

#[component]
fn ProcessStepRow(vm: ProcedureWizardViewModel, id: String) -> impl IntoView {
    let wizard = vm.wizard;
    let id = StoredValue::new(id);

    let field = move |key: &'static str| {
        Signal::derive(move || {
            vm.process_step_field(&id.get_value(), key)
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default()
        })
    };
    let set = move |key: &'static str| {
        Callback::new(move |value: String| {
            vm.update_process_step(&id.get_value(), key, Value::String(value))
        })
    };
    let position = move || vm.process_step_index(&id.get_value()).unwrap_or(0);
    let title_error = Signal::derive(move || {
        wizard.show_error(&format!("steps.{}.title", position()))
    });
    let required = Signal::derive(move || {
        vm.process_step_field(&id.get_value(), "required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    });

    view! {
        <div class="wizard__card">
            <div class="wizard__card-header">
                <span class="wizard__card-title">{move || format!("Étape {}", position() + 1)}</span>
                <Show when=move || { vm.process_step_ids().len() > 1 }>
                    <button
                        class="button button--ghost button--icon"
                        aria-label="Supprimer l'étape"
                        on:click=move |_| vm.remove_process_step(&id.get_value())
                    >
                        {icon("trash")}
                    </button>
                </Show>
            </div>
            <Input
                label="Titre"
                required=true
                value=field("title")
                on_input=set("title")
                error=title_error
            />
            <Textarea
                label="Description"
                rows=2
                value=field("description")
                on_input=set("description")
            />
            <Checkbox
                label="Étape obligatoire"
                checked=required
                on_change=Callback::new(move |checked: bool| {
                    vm.update_process_step(&id.get_value(), "required", Value::Bool(checked))
                })
            />
        </div>
    }
}

#[component]
pub fn ReviewStep(vm: ProcedureWizardViewModel) -> impl IntoView {
    let wizard = use_wizard();
    let value_or_dash = move |name: &'static str| move || review_text(&wizard.field_str(name));
    let cost = move || match wizard.field("cost").and_then(|v| v.as_f64()) {
        Some(cost) if cost > 0.0 => format!("{cost} DA"),
        _ => "Gratuit".to_string(),
    };

    view! {
        <div class="wizard__step wizard__review">
            <dl class="review__grid">
                <dt>"Nom"</dt>
                <dd>{value_or_dash("name")}</dd>
                <dt>"Catégorie"</dt>
                <dd>{value_or_dash("category")}</dd>
                <dt>"Organisme responsable"</dt>
                <dd>{value_or_dash("responsibleOrganization")}</dd>
                <dt>"Durée estimée"</dt>
                <dd>{value_or_dash("estimatedDuration")}</dd>
                <dt>"Coût"</dt>
                <dd>{cost}</dd>
            </dl>
            <h4>"Description"</h4>
            <div
                class="review__description"
                inner_html=move || sanitize_user_input(&wizard.field_str("description"), SanitizeMode::Html)
            ></div>
            <h4>"Prérequis"</h4>
            <ul>
                {move || vm.requirements().into_iter().map(|r| view! { <li>{r}</li> }).collect_view()}
            </ul>
            <h4>"Étapes"</h4>
            <ol>
                {move || {
                    vm.process_steps()
                        .into_iter()
                        .map(|s| {
                            let title = s.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
                            let required = s.get("required").and_then(Value::as_bool).unwrap_or(false);
                            view! {
                                <li>
                                    {title}
                                    {required.then(|| view! { <span class="badge">"obligatoire"</span> })}
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ol>
        </div>
    }
}
