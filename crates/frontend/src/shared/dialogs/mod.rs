//! Generic dialogs opened through the modal stack (`alert`, `confirmation`)

use crate::shared::components::ui::Button;
use crate::shared::icons::icon;
use crate::shared::modal_stack::ModalContext;
use leptos::prelude::*;

/// Message with a single acknowledge button.
///
/// Props: `message`, optional `variant` (`info`, `success`, `error`).
#[component]
pub fn AlertDialog(ctx: ModalContext) -> impl IntoView {
    let message = {
        let ctx = ctx.clone();
        move || ctx.prop_str("message").unwrap_or_default()
    };
    let variant_class = {
        let ctx = ctx.clone();
        move || {
            let variant = ctx.prop_str("variant").unwrap_or_else(|| "info".to_string());
            format!("dialog dialog--{variant}")
        }
    };
    let icon_name = {
        let ctx = ctx.clone();
        move || match ctx.prop_str("variant").as_deref() {
            Some("success") => "check",
            Some("error") => "alert-triangle",
            _ => "info",
        }
    };

    view! {
        <div class=variant_class>
            <div class="dialog__message">
                {move || icon(icon_name())}
                <p>{message}</p>
            </div>
            <div class="dialog__actions">
                <Button on_click=Callback::new(move |_| ctx.close())>"OK"</Button>
            </div>
        </div>
    }
}

/// Yes/no question.
///
/// Props: `message`, optional `confirm_label`, and `closes`: id of a modal to
/// close together with this one when the user confirms.
#[component]
pub fn ConfirmationDialog(ctx: ModalContext) -> impl IntoView {
    let message = {
        let ctx = ctx.clone();
        move || ctx.prop_str("message").unwrap_or_default()
    };
    let confirm_label = {
        let ctx = ctx.clone();
        move || ctx.prop_str("confirm_label").unwrap_or_else(|| "Confirmer".to_string())
    };

    let on_confirm = {
        let ctx = ctx.clone();
        Callback::new(move |_| {
            if let Some(target) = ctx.prop_str("closes") {
                ctx.svc().close_deferred(target);
            }
            ctx.close();
        })
    };
    let on_cancel = Callback::new(move |_| ctx.close());

    view! {
        <div class="dialog">
            <div class="dialog__message">
                {icon("alert-triangle")}
                <p>{message}</p>
            </div>
            <div class="dialog__actions">
                <Button variant="secondary" on_click=on_cancel>"Annuler"</Button>
                <Button variant="danger" on_click=on_confirm>{confirm_label}</Button>
            </div>
        </div>
    }
}
