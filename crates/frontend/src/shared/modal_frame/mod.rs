use crate::shared::icons::icon;
use crate::shared::modal_stack::state::{Backdrop, ModalSize};
use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Modal chrome: overlay, positioned surface and the title bar (back, title,
/// close). The body is whatever the renderer produced.
#[component]
pub fn ModalFrame(
    /// Close button and qualifying backdrop clicks
    on_close: Callback<()>,
    on_back: Callback<()>,
    #[prop(into)] title: Signal<Option<String>>,
    #[prop(into)] size: Signal<ModalSize>,
    #[prop(into)] backdrop: Signal<Backdrop>,
    #[prop(into)] closable: Signal<bool>,
    #[prop(into)] can_go_back: Signal<bool>,
    #[prop(into)] z_index: Signal<i32>,
    children: Children,
) -> impl IntoView {
    let overlay_mouse_down = RwSignal::new(false);

    let is_direct_overlay_event = |ev: &ev::MouseEvent| -> bool {
        match (ev.target(), ev.current_target()) {
            (Some(t), Some(ct)) => t == ct,
            _ => false,
        }
    };

    // Both press and release must land on the overlay itself, so selecting
    // text inside the modal and releasing outside does not close it.
    let handle_overlay_mouse_down = move |ev: ev::MouseEvent| {
        overlay_mouse_down.set(is_direct_overlay_event(&ev));
    };

    let handle_overlay_click = move |ev: ev::MouseEvent| {
        let closes = closable.get_untracked() && backdrop.get_untracked().closes_on_click();
        let should_close = closes && overlay_mouse_down.get() && is_direct_overlay_event(&ev);
        overlay_mouse_down.set(false);
        if should_close {
            // next tick: the overlay may be removed during its own click dispatch
            spawn_local(async move {
                TimeoutFuture::new(0).await;
                on_close.run(());
            });
        }
    };

    let stop_propagation = move |ev: ev::MouseEvent| {
        ev.stop_propagation();
    };

    let overlay_class = move || {
        if backdrop.get().is_rendered() {
            "modal-overlay"
        } else {
            "modal-overlay modal-overlay--bare"
        }
    };

    view! {
        <div
            class=overlay_class
            style=move || format!("z-index: {};", z_index.get())
            on:mousedown=handle_overlay_mouse_down
            on:click=handle_overlay_click
        >
            <div
                class=move || format!("modal {}", size.get().css_class())
                role="dialog"
                aria-modal="true"
                on:click=stop_propagation
            >
                <div class="modal__header">
                    <div class="modal__header-start">
                        <Show when=move || can_go_back.get()>
                            <button
                                class="button button--ghost button--icon"
                                aria-label="Retour"
                                on:click=move |_| on_back.run(())
                            >
                                {icon("arrow-left")}
                            </button>
                        </Show>
                        {move || title.get().map(|t| view! { <h2 class="modal__title">{t}</h2> })}
                    </div>
                    <Show when=move || closable.get()>
                        <button
                            class="button button--ghost button--icon"
                            aria-label="Fermer"
                            on:click=move |_| on_close.run(())
                        >
                            {icon("x")}
                        </button>
                    </Show>
                </div>
                <div class="modal__body">{children()}</div>
            </div>
        </div>
    }
}
