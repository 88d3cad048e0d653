//! # Screens
//!
//! A [`Screen`] is the host's implementation of one navigable unit: a set of
//! lifecycle hooks the router calls, never the screen itself. The router wraps
//! each built screen in a [`ScreenNode`], which carries the runtime state the
//! router owns on the screen's behalf:
//!
//! ```text
//! ScreenNode
//! ├── id / instance          // config id, unique per build
//! ├── active                 // visible + interactive
//! ├── phase                  // last lifecycle hook delivered
//! ├── visual                 // what transitions animate
//! ├── context                // ScreenContext (scope id, subscriptions)
//! └── screen                 // Box<dyn Screen>
//! ```
//!
//! Hook order over one instance's life:
//!
//! ```text
//! on_create → on_enter → (on_pause → on_resume)* → on_exit → … → on_destroy
//!                  └── on_refresh (re-navigated while current)
//! ```

pub mod context;
pub mod factory;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::{debug, error};
use serde_json::Value;

use crate::core::registry::ScreenId;
use crate::transition::TransitionConfig;

use context::{ContextId, ScreenContext};

/// Opaque navigation argument handed to `on_enter` / `on_refresh`.
pub type NavParam = Value;

/// Shared handle to a live screen instance. Identity is pointer identity.
pub type ScreenHandle = Rc<ScreenNode>;

/// Lifecycle hooks. All default to no-ops.
pub trait Screen {
    /// Once, right after the instance is built.
    fn on_create(&mut self, _cx: &mut ScreenContext) {}

    /// Each time the screen becomes the active top of the stack.
    fn on_enter(&mut self, _cx: &mut ScreenContext, _param: Option<&NavParam>) {}

    /// Another screen is being shown over this one.
    fn on_pause(&mut self, _cx: &mut ScreenContext) {}

    /// Top of the stack again after a pause.
    fn on_resume(&mut self, _cx: &mut ScreenContext) {}

    /// Re-navigated to while already current, or resumed through navigate-to.
    fn on_refresh(&mut self, _cx: &mut ScreenContext, _param: Option<&NavParam>) {}

    /// Leaving the top of the stack. Subscriptions made through `cx` are
    /// dropped right after this returns.
    fn on_exit(&mut self, _cx: &mut ScreenContext) {}

    /// The instance is being torn down.
    fn on_destroy(&mut self, _cx: &mut ScreenContext) {}

    /// Overlays leave the screen beneath them visible.
    fn is_overlay(&self) -> bool {
        false
    }

    /// Screen-specific transition; wins over registry and router defaults.
    fn transition_override(&self) -> Option<TransitionConfig> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Created,
    Entered,
    Paused,
    Exited,
    Destroyed,
}

/// Everything a transition may animate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub alpha: f32,
    pub scale: f32,
    /// Displacement in viewport fractions.
    pub offset: [f32; 2],
    pub interactable: bool,
    /// Draw order; higher draws later.
    pub z_order: u64,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            scale: 1.0,
            offset: [0.0, 0.0],
            interactable: true,
            z_order: 0,
        }
    }
}

impl VisualState {
    /// Resting state, keeping draw order.
    pub fn reset(&mut self) {
        *self = Self {
            z_order: self.z_order,
            ..Self::default()
        };
    }
}

// ============================================================================
// ScreenNode
// ============================================================================

pub struct ScreenNode {
    id: ScreenId,
    instance: InstanceId,
    parent_slot: Option<String>,
    overlay: bool,
    active: Cell<bool>,
    phase: Cell<LifecyclePhase>,
    visual: Cell<VisualState>,
    context: RefCell<ScreenContext>,
    screen: RefCell<Box<dyn Screen>>,
}

impl fmt::Debug for ScreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenNode")
            .field("id", &self.id)
            .field("instance", &self.instance)
            .field("context_id", &self.context_id())
            .field("active", &self.active.get())
            .field("phase", &self.phase.get())
            .finish_non_exhaustive()
    }
}

impl ScreenNode {
    pub fn new(
        id: ScreenId,
        instance: InstanceId,
        parent_slot: Option<String>,
        declared_overlay: bool,
        context: ScreenContext,
        screen: Box<dyn Screen>,
    ) -> Self {
        let overlay = declared_overlay || screen.is_overlay();
        Self {
            id,
            instance,
            parent_slot,
            overlay,
            active: Cell::new(false),
            phase: Cell::new(LifecyclePhase::Created),
            visual: Cell::new(VisualState::default()),
            context: RefCell::new(context),
            screen: RefCell::new(screen),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn context_id(&self) -> ContextId {
        self.context
            .try_borrow()
            .map(|cx| cx.context_id())
            .unwrap_or(ContextId::GLOBAL)
    }

    pub fn parent_slot(&self) -> Option<&str> {
        self.parent_slot.as_deref()
    }

    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase.get() == LifecyclePhase::Destroyed
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase.get()
    }

    pub fn visual(&self) -> VisualState {
        self.visual.get()
    }

    pub fn update_visual(&self, f: impl FnOnce(&mut VisualState)) {
        let mut v = self.visual.get();
        f(&mut v);
        self.visual.set(v);
    }

    pub fn transition_override(&self) -> Option<TransitionConfig> {
        self.screen
            .try_borrow()
            .ok()
            .and_then(|s| s.transition_override())
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.set(active);
        if !active {
            self.update_visual(|v| v.interactable = false);
        }
    }

    pub(crate) fn rebind_context(&self, context_id: ContextId) {
        if let Ok(mut cx) = self.context.try_borrow_mut() {
            cx.rebind(context_id);
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    fn with_screen(&self, hook: &str, f: impl FnOnce(&mut dyn Screen, &mut ScreenContext)) {
        let (Ok(mut screen), Ok(mut cx)) =
            (self.screen.try_borrow_mut(), self.context.try_borrow_mut())
        else {
            error!("Re-entrant {} on screen '{}' {} skipped", hook, self.id, self.instance);
            return;
        };
        debug!("{} {}: {}", self.id, self.instance, hook);
        f(&mut **screen, &mut *cx);
    }

    pub(crate) fn create(&self) {
        self.with_screen("on_create", |s, cx| s.on_create(cx));
        self.phase.set(LifecyclePhase::Created);
    }

    pub(crate) fn enter(&self, param: Option<&NavParam>) {
        self.with_screen("on_enter", |s, cx| s.on_enter(cx, param));
        self.phase.set(LifecyclePhase::Entered);
    }

    pub(crate) fn pause(&self) {
        self.with_screen("on_pause", |s, cx| s.on_pause(cx));
        self.phase.set(LifecyclePhase::Paused);
    }

    pub(crate) fn resume(&self) {
        self.with_screen("on_resume", |s, cx| s.on_resume(cx));
        self.phase.set(LifecyclePhase::Entered);
    }

    pub(crate) fn refresh(&self, param: Option<&NavParam>) {
        self.with_screen("on_refresh", |s, cx| s.on_refresh(cx, param));
    }

    pub(crate) fn exit(&self) {
        if self.is_destroyed() {
            return;
        }
        self.with_screen("on_exit", |s, cx| {
            s.on_exit(cx);
            cx.unsubscribe_all();
        });
        self.phase.set(LifecyclePhase::Exited);
    }

    /// Runs `on_destroy` once; later calls do nothing.
    pub(crate) fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.set_active(false);
        self.with_screen("on_destroy", |s, cx| {
            s.on_destroy(cx);
            cx.unsubscribe_all();
        });
        self.phase.set(LifecyclePhase::Destroyed);
    }
}
