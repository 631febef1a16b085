pub mod registry;
pub mod state;

use crate::shared::config::ModalStackConfig;
use crate::shared::icons::icon;
use crate::shared::modal_frame::ModalFrame;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use registry::{RendererRegistry, Resolution};
use serde_json::{Map, Value};
use state::{transition, ModalAction, ModalDescriptor, ModalRequest, ModalStackState, ModalUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::KeyboardEvent;

/// Builds the body of a modal from its context
pub type ModalRenderer = Arc<dyn Fn(ModalContext) -> AnyView + Send + Sync>;

pub type ModalRegistry = RendererRegistry<ModalRenderer>;

/// What a renderer gets to know about the modal it draws.
///
/// Can be cloned into event handlers to close the modal.
#[derive(Clone)]
pub struct ModalContext {
    id: String,
    svc: ModalStackService,
}

impl ModalContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn svc(&self) -> ModalStackService {
        self.svc
    }

    /// Current props (tracked)
    pub fn props(&self) -> Map<String, Value> {
        self.svc
            .descriptor(&self.id)
            .map(|d| d.props)
            .unwrap_or_default()
    }

    pub fn prop_str(&self, key: &str) -> Option<String> {
        self.props()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn close(&self) {
        self.svc.close_deferred(self.id.clone());
    }
}

/// Application-wide modal stack.
///
/// Wraps [`ModalStackState`] in a signal; every mutation goes through
/// [`transition`]. A closed modal stays in the state for the cleanup delay
/// counted from its own close, so a re-open within that window merges into
/// the retained descriptor.
#[derive(Clone, Copy)]
pub struct ModalStackService {
    state: RwSignal<ModalStackState>,
    cleanup_delay_ms: u32,
    /// Close counter per id; a pending cleanup only runs for the latest close
    closings: StoredValue<HashMap<String, u64>>,
}

impl ModalStackService {
    pub fn new(config: &ModalStackConfig) -> Self {
        Self {
            state: RwSignal::new(ModalStackState::new()),
            cleanup_delay_ms: config.cleanup_delay_ms,
            closings: StoredValue::new(HashMap::new()),
        }
    }

    fn dispatch(&self, action: ModalAction) {
        log::debug!("modal stack: {action:?}");
        self.state.update(|s| {
            let current = std::mem::take(s);
            *s = transition(current, action);
        });
    }

    fn defer(&self, f: impl FnOnce(ModalStackService) + 'static) {
        let svc = *self;
        spawn_local(async move {
            // next tick: the modal may be removed during the DOM event that closed it
            TimeoutFuture::new(0).await;
            f(svc);
        });
    }

    fn schedule_purge(&self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        let stamped: Vec<(String, u64)> = self
            .closings
            .try_update_value(|closings| {
                ids.into_iter()
                    .map(|id| {
                        let generation = closings.entry(id.clone()).or_default();
                        *generation += 1;
                        (id, *generation)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let svc = *self;
        let delay = self.cleanup_delay_ms;
        spawn_local(async move {
            TimeoutFuture::new(delay).await;
            // a later close of the same id restarts its grace period
            let due = svc.closings.try_update_value(|closings| {
                let due: Vec<String> = stamped
                    .into_iter()
                    .filter(|(id, generation)| closings.get(id) == Some(generation))
                    .map(|(id, _)| id)
                    .collect();
                for id in &due {
                    closings.remove(id);
                }
                due
            });
            let purged = due.and_then(|due| {
                svc.state.try_update(|s| {
                    let current = std::mem::take(s);
                    *s = transition(current, ModalAction::PurgeClosed(due));
                })
            });
            if purged.is_none() {
                log::debug!("modal stack: disposed before purge");
            }
        });
    }

    pub fn open(&self, request: ModalRequest) {
        self.dispatch(ModalAction::Open(request));
    }

    pub fn close(&self, id: impl Into<String>) {
        let id = id.into();
        self.dispatch(ModalAction::Close(id.clone()));
        self.schedule_purge(vec![id]);
    }

    pub fn close_deferred(&self, id: impl Into<String>) {
        let id = id.into();
        self.defer(move |svc| svc.close(id));
    }

    pub fn close_all(&self) {
        self.dispatch(ModalAction::CloseAll);
        let closed = self.state.with_untracked(|s| {
            s.modals
                .iter()
                .filter(|m| !m.is_open)
                .map(|m| m.id.clone())
                .collect()
        });
        self.schedule_purge(closed);
    }

    pub fn update(&self, id: impl Into<String>, updates: ModalUpdate) {
        self.dispatch(ModalAction::Update {
            id: id.into(),
            updates,
        });
    }

    pub fn navigate_to(&self, id: impl Into<String>) {
        self.dispatch(ModalAction::NavigateTo(id.into()));
    }

    pub fn go_back(&self) {
        self.dispatch(ModalAction::GoBack);
    }

    pub fn is_any_modal_open(&self) -> bool {
        self.state.with(|s| s.is_any_modal_open())
    }

    pub fn can_go_back(&self) -> bool {
        self.state.with(|s| s.can_go_back())
    }

    pub fn active_modal_id(&self) -> Option<String> {
        self.state.with(|s| s.active_modal_id.clone())
    }

    pub fn descriptor(&self, id: &str) -> Option<ModalDescriptor> {
        self.state.with(|s| s.descriptor(id).cloned())
    }

    /// Ids of open modals, highest priority first
    pub fn render_order(&self) -> Vec<String> {
        self.state
            .with(|s| s.render_order().into_iter().map(|m| m.id.clone()).collect())
    }

    fn accepts_load(&self, id: &str) -> bool {
        self.state
            .try_with_untracked(|s| s.accepts_load(id))
            .unwrap_or(false)
    }
}

pub fn use_modal_stack() -> ModalStackService {
    use_context::<ModalStackService>()
        .expect("ModalStackService not provided in context (provide it in app root)")
}

#[derive(Clone)]
enum ModalContent {
    Loading,
    Ready(ModalRenderer),
    NotFound(String),
}

/// Renders the modal stack at the application root.
///
/// Must be mounted exactly once.
#[component]
pub fn ModalHost() -> impl IntoView {
    let svc = use_modal_stack();
    let registry = use_context::<Arc<ModalRegistry>>()
        .expect("ModalRegistry not provided in context (provide it in app root)");

    // Global Escape handler: closes the active modal when it allows it.
    Effect::new(move |_| {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
                if keyboard_event.key() != "Escape" {
                    return;
                }
                let active = svc
                    .state
                    .get_untracked()
                    .active_modal_id
                    .and_then(|id| svc.state.with_untracked(|s| s.descriptor(&id).cloned()));
                if let Some(modal) = active.filter(|m| m.is_open && m.closable) {
                    svc.close_deferred(modal.id);
                }
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            // ModalHost lives as long as the app
            closure.forget();
        }
    });

    view! {
        <Show when=move || svc.is_any_modal_open()>
            <For
                each=move || svc.render_order()
                key=|id| id.clone()
                children={
                    let registry = registry.clone();
                    move |id| {
                        view! { <ModalWindow id=id svc=svc registry=registry.clone()/> }
                    }
                }
            />
        </Show>
    }
}

#[component]
fn ModalWindow(id: String, svc: ModalStackService, registry: Arc<ModalRegistry>) -> impl IntoView {
    let descriptor = Memo::new({
        let id = id.clone();
        move |_| svc.descriptor(&id)
    });
    let component_key = Memo::new(move |_| descriptor.with(|d| d.as_ref().map(|d| d.component_key.clone())));
    let content = RwSignal::new(ModalContent::Loading);

    Effect::new({
        let id = id.clone();
        move |_| {
            let Some(key) = component_key.get() else {
                return;
            };
            match registry.resolve(&key) {
                Resolution::Ready(renderer) => content.set(ModalContent::Ready(renderer)),
                Resolution::NotFound => content.set(ModalContent::NotFound(key)),
                Resolution::Pending(load) => {
                    content.set(ModalContent::Loading);
                    let id = id.clone();
                    spawn_local(async move {
                        let renderer = load.await;
                        if !svc.accepts_load(&id) {
                            log::debug!("modal {id}: closed while loading, discarding renderer");
                            return;
                        }
                        let _ = content.try_set(ModalContent::Ready(renderer));
                    });
                }
            }
        }
    });

    let z_index = Signal::derive({
        let id = id.clone();
        move || {
            let order = svc.render_order();
            let position = order.iter().position(|o| *o == id).unwrap_or(0);
            // first in render order sits on top
            1000 + (order.len() - position) as i32
        }
    });

    let on_close = Callback::new({
        let id = id.clone();
        move |_| {
            let closable = descriptor.with_untracked(|d| d.as_ref().map(|d| d.closable));
            if closable == Some(true) {
                svc.close_deferred(id.clone());
            }
        }
    });
    let on_back = Callback::new(move |_| svc.go_back());

    let body = {
        let id = id.clone();
        move || match content.get() {
            ModalContent::Loading => view! {
                <div class="modal__loading">
                    {icon("loader")}
                    <span>"Chargement..."</span>
                </div>
            }
            .into_any(),
            ModalContent::NotFound(key) => {
                let id = id.clone();
                view! {
                    <div class="modal__missing">
                        <p class="text-error">{format!("Composant modal introuvable: {key}")}</p>
                        <button
                            class="button button--primary"
                            on:click=move |_| svc.close_deferred(id.clone())
                        >
                            "Fermer"
                        </button>
                    </div>
                }
                .into_any()
            }
            ModalContent::Ready(renderer) => renderer(ModalContext {
                id: id.clone(),
                svc,
            }),
        }
    };

    view! {
        <ModalFrame
            on_close=on_close
            on_back=on_back
            title=Signal::derive(move || descriptor.with(|d| d.as_ref().and_then(|d| d.title.clone())))
            size=Signal::derive(move || descriptor.with(|d| d.as_ref().map(|d| d.size).unwrap_or_default()))
            backdrop=Signal::derive(move || descriptor.with(|d| d.as_ref().map(|d| d.backdrop).unwrap_or_default()))
            closable=Signal::derive(move || descriptor.with(|d| d.as_ref().map(|d| d.closable).unwrap_or(false)))
            can_go_back=Signal::derive(move || svc.can_go_back())
            z_index=z_index
        >
            {body}
        </ModalFrame>
    }
}
