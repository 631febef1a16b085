use crate::shared::icons::icon;
use leptos::prelude::*;

/// Button with variants (primary, secondary, ghost, danger) and a busy state
#[component]
pub fn Button(
    /// "primary" (default), "secondary", "ghost" or "danger"
    #[prop(optional, into)]
    variant: MaybeProp<String>,
    #[prop(optional, into)]
    disabled: MaybeProp<bool>,
    /// Shows a spinner and disables the button
    #[prop(optional, into)]
    loading: MaybeProp<bool>,
    #[prop(optional)]
    on_click: Option<Callback<leptos::ev::MouseEvent>>,
    children: Children,
) -> impl IntoView {
    let variant_class = move || match variant.get().as_deref().unwrap_or("primary") {
        "secondary" => "button--secondary",
        "ghost" => "button--ghost",
        "danger" => "button--danger",
        _ => "button--primary",
    };
    let is_loading = move || loading.get().unwrap_or(false);

    view! {
        <button
            type="button"
            class=move || format!("button {}", variant_class())
            disabled=move || disabled.get().unwrap_or(false) || is_loading()
            on:click=move |ev| {
                if let Some(handler) = on_click {
                    handler.run(ev);
                }
            }
        >
            <Show when=is_loading>{icon("loader")}</Show>
            {children()}
        </button>
    }
}
