use crate::domain::a001_procedure::ui::wizard::ProcedureWizard;
use crate::shared::components::ui::Button;
use crate::shared::config::load_config;
use crate::shared::dialogs::{AlertDialog, ConfirmationDialog};
use crate::shared::icons::icon;
use crate::shared::modal_stack::registry::RendererRegistry;
use crate::shared::modal_stack::state::{Backdrop, ModalRequest, ModalSize};
use crate::shared::modal_stack::{
    ModalContext, ModalHost, ModalRegistry, ModalRenderer, ModalStackService,
};
use leptos::prelude::*;
use std::sync::Arc;

/// Renderers available to `ModalRequest::component_key`
pub fn modal_registry() -> ModalRegistry {
    RendererRegistry::new()
        .register("procedure-form", || async {
            Arc::new(|ctx: ModalContext| view! { <ProcedureWizard ctx=ctx/> }.into_any())
                as ModalRenderer
        })
        .register("confirmation", || async {
            Arc::new(|ctx: ModalContext| view! { <ConfirmationDialog ctx=ctx/> }.into_any())
                as ModalRenderer
        })
        .register("alert", || async {
            Arc::new(|ctx: ModalContext| view! { <AlertDialog ctx=ctx/> }.into_any())
                as ModalRenderer
        })
}

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();

    // Modal stack and its renderers for the whole app
    let modal_stack = ModalStackService::new(&config.modals);
    provide_context(modal_stack);
    provide_context(Arc::new(modal_registry()));
    provide_context(config);

    let open_procedure_form = Callback::new(move |_| {
        modal_stack.open(
            ModalRequest::new("procedure-form", "procedure-form")
                .title("Nouvelle procédure administrative")
                .size(ModalSize::Lg)
                .backdrop(Backdrop::Static),
        )
    });

    view! {
        <div class="app">
            <header class="app__header">
                <div class="app__brand">
                    {icon("file-text")}
                    <span>"dalil.dz"</span>
                </div>
                <Button on_click=open_procedure_form>
                    {icon("plus")}
                    "Nouvelle procédure"
                </Button>
            </header>
            <main class="app__main">
                <p class="app__hint">
                    "Créez une procédure administrative à partir de l'assistant."
                </p>
            </main>
            <ModalHost/>
        </div>
    }
}
