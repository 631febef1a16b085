//! Modal stack state machine.
//!
//! The stack is a plain value (`ModalStackState`) changed only through
//! [`transition`], one [`ModalAction`] at a time. Nothing here knows about
//! rendering; `ModalStackService` wraps it in a signal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
    Full,
}

impl ModalSize {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Sm => "modal--sm",
            Self::Md => "modal--md",
            Self::Lg => "modal--lg",
            Self::Xl => "modal--xl",
            Self::Full => "modal--full",
        }
    }
}

/// What a click outside the modal surface does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backdrop {
    /// Backdrop rendered, outside clicks ignored
    Static,
    /// Backdrop rendered, outside clicks close the modal
    #[default]
    Click,
    /// No backdrop at all
    None,
}

impl Backdrop {
    pub fn is_rendered(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn closes_on_click(self) -> bool {
        matches!(self, Self::Click)
    }
}

/// Declarative record of one dialog, independent of whether it is rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalDescriptor {
    pub id: String,
    pub component_key: String,
    pub props: Map<String, Value>,
    pub title: Option<String>,
    pub size: ModalSize,
    pub closable: bool,
    pub persistent: bool,
    pub backdrop: Backdrop,
    pub priority: i32,
    pub is_open: bool,
}

impl ModalDescriptor {
    /// Whether an outside click should close this modal
    pub fn closes_on_backdrop_click(&self) -> bool {
        self.closable && self.backdrop.closes_on_click()
    }
}

/// Request to open (or re-open) a modal.
///
/// Fields left as `None` keep their stored value on re-open, or take the
/// descriptor default on first open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalRequest {
    pub id: String,
    pub component_key: String,
    pub props: Option<Map<String, Value>>,
    pub title: Option<String>,
    pub size: Option<ModalSize>,
    pub closable: Option<bool>,
    pub persistent: Option<bool>,
    pub backdrop: Option<Backdrop>,
    pub priority: Option<i32>,
}

impl ModalRequest {
    pub fn new(id: impl Into<String>, component_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_key: component_key.into(),
            ..Default::default()
        }
    }

    pub fn props(mut self, props: Map<String, Value>) -> Self {
        self.props = Some(props);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn size(mut self, size: ModalSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = Some(closable);
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = Some(persistent);
        self
    }

    pub fn backdrop(mut self, backdrop: Backdrop) -> Self {
        self.backdrop = Some(backdrop);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    fn into_descriptor(self) -> ModalDescriptor {
        ModalDescriptor {
            id: self.id,
            component_key: self.component_key,
            props: self.props.unwrap_or_default(),
            title: self.title,
            size: self.size.unwrap_or_default(),
            closable: self.closable.unwrap_or(true),
            persistent: self.persistent.unwrap_or(false),
            backdrop: self.backdrop.unwrap_or_default(),
            priority: self.priority.unwrap_or(0),
            is_open: true,
        }
    }

    fn merge_into(self, target: &mut ModalDescriptor) {
        target.component_key = self.component_key;
        let updates = ModalUpdate {
            component_key: None,
            props: self.props,
            title: self.title,
            size: self.size,
            closable: self.closable,
            persistent: self.persistent,
            backdrop: self.backdrop,
            priority: self.priority,
            is_open: Some(true),
        };
        updates.apply_to(target);
    }
}

/// Partial update of a descriptor; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalUpdate {
    pub component_key: Option<String>,
    pub props: Option<Map<String, Value>>,
    pub title: Option<String>,
    pub size: Option<ModalSize>,
    pub closable: Option<bool>,
    pub persistent: Option<bool>,
    pub backdrop: Option<Backdrop>,
    pub priority: Option<i32>,
    pub is_open: Option<bool>,
}

impl ModalUpdate {
    fn apply_to(self, target: &mut ModalDescriptor) {
        if let Some(key) = self.component_key {
            target.component_key = key;
        }
        if let Some(props) = self.props {
            target.props = props;
        }
        if self.title.is_some() {
            target.title = self.title;
        }
        if let Some(size) = self.size {
            target.size = size;
        }
        if let Some(closable) = self.closable {
            target.closable = closable;
        }
        if let Some(persistent) = self.persistent {
            target.persistent = persistent;
        }
        if let Some(backdrop) = self.backdrop {
            target.backdrop = backdrop;
        }
        if let Some(priority) = self.priority {
            target.priority = priority;
        }
        if let Some(is_open) = self.is_open {
            target.is_open = is_open;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalAction {
    Open(ModalRequest),
    Close(String),
    CloseAll,
    Update { id: String, updates: ModalUpdate },
    NavigateTo(String),
    GoBack,
    /// Drop the named descriptors when they are still closed, not persistent
    /// and no longer referenced by the history
    PurgeClosed(Vec<String>),
}

/// The whole modal stack.
///
/// Invariant: `active_modal_id == history.last()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalStackState {
    pub modals: Vec<ModalDescriptor>,
    pub active_modal_id: Option<String>,
    pub history: Vec<String>,
}

impl ModalStackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor(&self, id: &str) -> Option<&ModalDescriptor> {
        self.modals.iter().find(|m| m.id == id)
    }

    pub fn is_any_modal_open(&self) -> bool {
        self.modals.iter().any(|m| m.is_open)
    }

    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    /// Open descriptors, highest priority first; equal priorities keep
    /// insertion order.
    pub fn render_order(&self) -> Vec<&ModalDescriptor> {
        let mut open: Vec<&ModalDescriptor> = self.modals.iter().filter(|m| m.is_open).collect();
        open.sort_by_key(|m| Reverse(m.priority));
        open
    }

    /// Whether a renderer that finished loading for `id` may still be shown
    pub fn accepts_load(&self, id: &str) -> bool {
        self.descriptor(id).map(|m| m.is_open).unwrap_or(false)
    }

    fn descriptor_mut(&mut self, id: &str) -> Option<&mut ModalDescriptor> {
        self.modals.iter_mut().find(|m| m.id == id)
    }

    fn sync_active(&mut self) {
        self.active_modal_id = self.history.last().cloned();
    }
}

/// Apply one action to the stack.
///
/// Total over every input: unknown ids leave the state as it was.
pub fn transition(mut state: ModalStackState, action: ModalAction) -> ModalStackState {
    match action {
        ModalAction::Open(request) => {
            let id = request.id.clone();
            match state.descriptor_mut(&id) {
                Some(existing) => request.merge_into(existing),
                None => state.modals.push(request.into_descriptor()),
            }
            state.history.push(id);
            state.sync_active();
        }
        ModalAction::Close(id) => {
            let Some(modal) = state.descriptor_mut(&id) else {
                return state;
            };
            if modal.persistent {
                return state;
            }
            modal.is_open = false;
            state.history.retain(|h| *h != id);
            state.sync_active();
        }
        ModalAction::CloseAll => {
            for modal in state.modals.iter_mut().filter(|m| !m.persistent) {
                modal.is_open = false;
            }
            state.history.clear();
            state.active_modal_id = None;
        }
        ModalAction::Update { id, updates } => {
            if let Some(modal) = state.descriptor_mut(&id) {
                updates.apply_to(modal);
            }
        }
        ModalAction::NavigateTo(id) => {
            if state.descriptor(&id).is_some() {
                state.history.push(id);
                state.sync_active();
            }
        }
        ModalAction::GoBack => {
            state.history.pop();
            state.sync_active();
        }
        ModalAction::PurgeClosed(ids) => {
            let history = &state.history;
            state.modals.retain(|m| {
                m.is_open || m.persistent || !ids.contains(&m.id) || history.contains(&m.id)
            });
        }
    }
    state
}
