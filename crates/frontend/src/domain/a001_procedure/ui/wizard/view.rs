use super::steps::{GeneralStep, ProcessStep, RequirementsStep, ReviewStep};
use super::view_model::ProcedureWizardViewModel;
use crate::shared::components::ui::Button;
use crate::shared::config::AppConfig;
use crate::shared::icons::icon;
use crate::shared::modal_stack::state::ModalUpdate;
use crate::shared::modal_stack::ModalContext;
use leptos::prelude::*;

/// Procedure creation wizard, rendered inside a modal
#[component]
pub fn ProcedureWizard(ctx: ModalContext) -> impl IntoView {
    let config = use_context::<AppConfig>()
        .map(|c| c.wizard)
        .unwrap_or_default();
    let vm = ProcedureWizardViewModel::new(&config);
    let wizard = vm.wizard;

    // only re-render the body when the step itself changes
    let current = Memo::new(move |_| wizard.current_step());
    let titles: Vec<String> = wizard.with(|c| c.options().steps.iter().map(|s| s.title.clone()).collect());
    let is_last = move || current.get() >= wizard.total_steps();
    let submitting = Signal::derive(move || wizard.is_submitting());

    // step counter in the modal title
    Effect::new({
        let ctx = ctx.clone();
        let total = titles.len();
        move |_| {
            let step = current.get();
            ctx.svc().update(
                ctx.id(),
                ModalUpdate {
                    title: Some(format!("Nouvelle procédure administrative ({step}/{total})")),
                    ..Default::default()
                },
            );
        }
    });

    let on_cancel = {
        let ctx = ctx.clone();
        Callback::new(move |_| vm.cancel_command(&ctx))
    };
    let on_submit = Callback::new(move |_| vm.submit_command(ctx.clone()));

    view! {
        <div class="wizard">
            <ol class="wizard__progress">
                {titles
                    .into_iter()
                    .enumerate()
                    .map(|(i, title)| {
                        let number = i + 1;
                        let class = move || {
                            let step = current.get();
                            if number == step {
                                "wizard__progress-item wizard__progress-item--active"
                            } else if number < step {
                                "wizard__progress-item wizard__progress-item--done"
                            } else {
                                "wizard__progress-item"
                            }
                        };
                        view! {
                            <li
                                class=class
                                on:click=move |_| {
                                    if number < current.get_untracked() {
                                        wizard.go_to_step(number);
                                    }
                                }
                            >
                                <span class="wizard__progress-number">{number}</span>
                                <span class="wizard__progress-title">{title}</span>
                            </li>
                        }
                    })
                    .collect_view()}
            </ol>

            {move || vm.error.get().map(|e| view! { <div class="wizard__error">{e}</div> })}

            <div class="wizard__body">
                {move || match current.get() {
                    1 => view! { <GeneralStep/> }.into_any(),
                    2 => view! { <RequirementsStep vm=vm/> }.into_any(),
                    3 => view! { <ProcessStep vm=vm/> }.into_any(),
                    _ => view! { <ReviewStep vm=vm/> }.into_any(),
                }}
            </div>

            <div class="wizard__footer">
                <Button variant="ghost" on_click=on_cancel disabled=submitting>
                    "Annuler"
                </Button>
                <div class="wizard__footer-nav">
                    <Show when=move || { current.get() > 1 }>
                        <Button
                            variant="secondary"
                            on_click=Callback::new(move |_| vm.prev_command())
                            disabled=submitting
                        >
                            {icon("arrow-left")}
                            "Précédent"
                        </Button>
                    </Show>
                    <Show
                        when=is_last
                        fallback=move || view! {
                            <Button on_click=Callback::new(move |_| vm.next_command())>
                                "Suivant"
                                {icon("arrow-right")}
                            </Button>
                        }
                    >
                        <Button on_click=on_submit loading=submitting>
                            {icon("check")}
                            "Créer la procédure"
                        </Button>
                    </Show>
                </div>
            </div>
        </div>
    }
}
