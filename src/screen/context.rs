//! # Screen Context
//!
//! A context id tags one logical instance tree: a root screen instance gets a
//! fresh id, and every child built under it inherits the parent instance's id
//! at creation time. Scoped events published by any screen in the tree reach
//! every other screen in the same tree, and nobody else.
//!
//! [`ScreenContext`] is the handle a screen gets in each lifecycle hook. It
//! owns the screen's subscriptions; the router drops them on exit and destroy.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::core::registry::ScreenId;
use crate::events::{ContextEvent, DataChanged, EventBus, SetLabel, SetLabels, Subscription};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl ContextId {
    /// Reaches every scope.
    pub const GLOBAL: ContextId = ContextId(0);

    pub fn is_global(self) -> bool {
        self == Self::GLOBAL
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Hands out context ids, never [`ContextId::GLOBAL`].
#[derive(Debug, Default)]
pub struct ContextAllocator {
    last: Cell<u64>,
}

impl ContextAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> ContextId {
        let next = self.last.get() + 1;
        self.last.set(next);
        ContextId(next)
    }
}

// ============================================================================
// ScreenContext
// ============================================================================

pub struct ScreenContext {
    screen_id: ScreenId,
    /// Shared with scoped subscription filters so a rebind retargets them.
    context_id: Rc<Cell<ContextId>>,
    bus: EventBus,
    subscriptions: Vec<Subscription>,
}

impl fmt::Debug for ScreenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenContext")
            .field("screen_id", &self.screen_id)
            .field("context_id", &self.context_id.get())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl ScreenContext {
    pub fn new(screen_id: ScreenId, context_id: ContextId, bus: EventBus) -> Self {
        Self {
            screen_id,
            context_id: Rc::new(Cell::new(context_id)),
            bus,
            subscriptions: Vec::new(),
        }
    }

    pub fn screen_id(&self) -> &str {
        &self.screen_id
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id.get()
    }

    pub(crate) fn rebind(&mut self, context_id: ContextId) {
        self.context_id.set(context_id);
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Handles `E` published in this screen's scope or globally.
    pub fn subscribe<E: ContextEvent>(&mut self, handler: impl Fn(&E) + 'static) {
        let scope = Rc::clone(&self.context_id);
        let sub = self.bus.subscribe(move |evt: &E| {
            let ctx = evt.context_id();
            if ctx == scope.get() || ctx.is_global() {
                handler(evt);
            }
        });
        self.subscriptions.push(sub);
    }

    /// Handles every `E`, scope or not.
    pub fn subscribe_global<E: 'static>(&mut self, handler: impl Fn(&E) + 'static) {
        let sub = self.bus.subscribe(handler);
        self.subscriptions.push(sub);
    }

    /// Publishes `event` stamped with this screen's context id.
    pub fn publish<E: ContextEvent>(&self, event: E) {
        self.bus.publish_scoped(event, self.context_id.get());
    }

    pub fn set_label(&self, key: impl Into<String>, text: impl Into<String>) {
        self.publish(SetLabel {
            key: key.into(),
            text: text.into(),
            ..Default::default()
        });
    }

    pub fn set_labels<K, V>(&self, labels: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let labels: BTreeMap<String, String> = labels
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.publish(SetLabels {
            labels,
            ..Default::default()
        });
    }

    pub fn notify_data_changed(&self, key: impl Into<String>, value: Value) {
        self.publish(DataChanged {
            key: key.into(),
            value,
            ..Default::default()
        });
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn unsubscribe_all(&mut self) {
        self.subscriptions.clear();
    }
}
