//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::registry::{Registry, ScreenConfig};
use crate::events::EventBus;
use crate::router::Router;
use crate::screen::context::{ContextId, ScreenContext};
use crate::screen::factory::FactoryRegistry;
use crate::screen::{InstanceId, NavParam, Screen, ScreenNode};
use crate::transition::{ScreenTransition, TransitionCatalog, TransitionConfig};

/// Shared, ordered log of lifecycle hooks.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Writes `"<id>:<hook>"` to a journal for every hook, with the param
/// appended as JSON for `enter` and `refresh`.
pub struct RecordingScreen {
    id: String,
    journal: Journal,
}

impl RecordingScreen {
    pub fn new(id: impl Into<String>, journal: Journal) -> Self {
        Self {
            id: id.into(),
            journal,
        }
    }

    fn log(&self, hook: &str, param: Option<&NavParam>) {
        match param {
            Some(p) => self.journal.record(format!("{}:{} {}", self.id, hook, p)),
            None => self.journal.record(format!("{}:{}", self.id, hook)),
        }
    }
}

impl Screen for RecordingScreen {
    fn on_create(&mut self, _cx: &mut ScreenContext) {
        self.log("create", None);
    }

    fn on_enter(&mut self, _cx: &mut ScreenContext, param: Option<&NavParam>) {
        self.log("enter", param);
    }

    fn on_pause(&mut self, _cx: &mut ScreenContext) {
        self.log("pause", None);
    }

    fn on_resume(&mut self, _cx: &mut ScreenContext) {
        self.log("resume", None);
    }

    fn on_refresh(&mut self, _cx: &mut ScreenContext, param: Option<&NavParam>) {
        self.log("refresh", param);
    }

    fn on_exit(&mut self, _cx: &mut ScreenContext) {
        self.log("exit", None);
    }

    fn on_destroy(&mut self, _cx: &mut ScreenContext) {
        self.log("destroy", None);
    }
}

struct Blank;

impl Screen for Blank {}

/// A node outside any router, for exercising transitions directly.
pub fn detached_node(id: &str) -> ScreenNode {
    ScreenNode::new(
        id.to_string(),
        InstanceId(1),
        None,
        false,
        ScreenContext::new(id.to_string(), ContextId(1), EventBus::new()),
        Box::new(Blank),
    )
}

/// Factory whose fallback builds a [`RecordingScreen`] for any key.
pub fn recording_factory(journal: &Journal) -> FactoryRegistry {
    let journal = journal.clone();
    FactoryRegistry::new().with_fallback(move |config, _| {
        Ok(Box::new(RecordingScreen::new(&config.id, journal.clone())) as Box<dyn Screen>)
    })
}

/// Router over `configs` with instant transitions and recording screens.
pub fn recording_router(configs: Vec<ScreenConfig>, journal: &Journal) -> Rc<Router> {
    recording_router_with(configs, journal, |_| {})
}

/// Like [`recording_router`], letting the test register extra builders.
pub fn recording_router_with(
    configs: Vec<ScreenConfig>,
    journal: &Journal,
    customize: impl FnOnce(&mut FactoryRegistry),
) -> Rc<Router> {
    let mut factory = recording_factory(journal);
    customize(&mut factory);
    Rc::new(
        Router::new(Registry::from_configs(configs), factory)
            .with_default_transition(TransitionConfig::instant()),
    )
}

// ============================================================================
// GateTransition
// ============================================================================

/// Enter transition that only finishes once the test opens the gate.
/// `Notify` keeps one permit, so opening the gate early lets the next
/// transition through immediately.
pub struct GateTransition {
    gate: Rc<Notify>,
}

#[async_trait(?Send)]
impl ScreenTransition for GateTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
    }

    async fn transition_in(&self, _screen: &ScreenNode) {
        self.gate.notified().await;
    }

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.reset());
    }
}

/// Recording router whose every enter transition waits on `gate`.
pub fn gated_router(configs: Vec<ScreenConfig>, journal: &Journal, gate: Rc<Notify>) -> Rc<Router> {
    let catalog = TransitionCatalog::new().with("gate", move |_| {
        Rc::new(GateTransition { gate: gate.clone() }) as Rc<dyn ScreenTransition>
    });
    Rc::new(
        Router::new(Registry::from_configs(configs), recording_factory(journal))
            .with_catalog(catalog)
            .with_default_transition(TransitionConfig::custom("gate")),
    )
}
