//! # Event Bus
//!
//! Typed publish/subscribe, one handler list per event type.
//!
//! The bus is an ordinary value owned by whoever creates it (the router owns
//! one) and cloned by handle. Dropping the owner, or calling
//! [`EventBus::clear`], tears every subscription down with it, so handlers
//! never leak across router lifetimes.
//!
//! ```text
//! EventBus ── Rc<RefCell<BusInner>>
//!               └── handlers: TypeId → [(SubscriptionId, Rc<dyn Fn(&E)>)]
//! ```
//!
//! Delivery is synchronous and in subscription order. Handlers may subscribe,
//! unsubscribe or publish from inside a callback; the handler list is
//! snapshotted before fan-out.

pub mod ui;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

use crate::screen::context::ContextId;

pub use ui::{ActivateOnlyInGroup, ButtonClicked, DataChanged, SetLabel, SetLabels};

/// Events delivered within a screen scope carry the [`ContextId`] of the
/// screen tree that published them. [`ContextId::GLOBAL`] reaches every scope.
pub trait ContextEvent: 'static {
    fn context_id(&self) -> ContextId;
    fn set_context_id(&mut self, id: ContextId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<TypeId, Vec<(SubscriptionId, Rc<dyn Any>)>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("event_types", &inner.handlers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every published `E`. The handler stays live
    /// until the returned [`Subscription`] is dropped.
    pub fn subscribe<E: 'static>(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        let handler: Handler<E> = Rc::new(handler);
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner
            .handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, Rc::new(handler) as Rc<dyn Any>));

        Subscription {
            bus: Rc::downgrade(&self.inner),
            type_id: TypeId::of::<E>(),
            id,
        }
    }

    /// Delivers `event` to every handler registered for `E`.
    pub fn publish<E: 'static>(&self, event: &E) {
        let handlers: Vec<Handler<E>> = {
            let inner = self.inner.borrow();
            match inner.handlers.get(&TypeId::of::<E>()) {
                Some(list) => list
                    .iter()
                    .filter_map(|(_, h)| h.downcast_ref::<Handler<E>>().cloned())
                    .collect(),
                None => return,
            }
        };
        trace!(
            "Publishing {} to {} handler(s)",
            std::any::type_name::<E>(),
            handlers.len()
        );
        for handler in handlers {
            handler(event);
        }
    }

    /// Stamps `event` with `context` and publishes it.
    pub fn publish_scoped<E: ContextEvent>(&self, mut event: E, context: ContextId) {
        event.set_context_id(context);
        self.publish(&event);
    }

    pub fn handler_count<E: 'static>(&self) -> usize {
        self.inner
            .borrow()
            .handlers
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Drops every handler of every type.
    pub fn clear(&self) {
        self.inner.borrow_mut().handlers.clear();
    }

    fn remove(inner: &RefCell<BusInner>, type_id: TypeId, id: SubscriptionId) {
        let Ok(mut inner) = inner.try_borrow_mut() else {
            return;
        };
        if let Some(list) = inner.handlers.get_mut(&type_id) {
            list.retain(|(sid, _)| *sid != id);
            if list.is_empty() {
                inner.handlers.remove(&type_id);
            }
        }
    }
}

/// Keeps a handler registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler immediately"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    type_id: TypeId,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            EventBus::remove(&inner, self.type_id, self.id);
        }
    }
}
