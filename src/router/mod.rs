//! # Router
//!
//! The navigation state machine. Owns the stack of open screens, every live
//! screen instance, and the parent/child index, and is the only thing that
//! calls screen lifecycle hooks.
//!
//! ```text
//!            admit()                    execute()
//! request ──► Busy? empty id? ──ticket──► TransitionStart
//!               │                         sequence (push/pop/…)   ◄── awaits transitions
//!               └─► Ignored               settle: exclusivity, sweep
//!                                         TransitionEnd, ticket dropped ──► Idle
//! ```
//!
//! Only one navigation runs at a time. A request made while another is in
//! flight is dropped, never queued; callers watch [`Router::is_transitioning`]
//! or the [`RouterEvent`] stream.
//!
//! The router is single-threaded (`!Send`). Awaiting the `async` entry points
//! works anywhere; [`Router::request`] spawns onto the current
//! [`tokio::task::LocalSet`].
//!
//! ## Modules
//!
//! - [`command`]: `NavCommand`, navigation requests as data
//! - `hierarchy`: instance resolution, ancestor activation, exclusivity, release
//! - `navigation`: the push/pop/replace/home/navigate-to sequences

pub mod command;
mod hierarchy;
mod navigation;

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::core::error::NavigationError;
use crate::core::registry::{Registry, ScreenId};
use crate::events::{EventBus, Subscription};
use crate::screen::context::ContextAllocator;
use crate::screen::factory::ScreenFactory;
use crate::screen::{NavParam, ScreenHandle};
use crate::transition::{ScreenTransition, TransitionCatalog, TransitionConfig};

pub use command::NavCommand;

// ============================================================================
// Outcomes and notifications
// ============================================================================

/// Why a request was dropped without running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another navigation is in flight.
    Busy,
    /// The command named an empty screen id (or no home is configured).
    EmptyId,
    /// `pop` with one entry or fewer on the stack.
    AtRoot,
    /// The target already has a slot on the stack.
    AlreadyInStack,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Busy => write!(f, "navigation already in progress"),
            IgnoreReason::EmptyId => write!(f, "empty screen id"),
            IgnoreReason::AtRoot => write!(f, "stack is at its root"),
            IgnoreReason::AlreadyInStack => write!(f, "screen is already on the stack"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum NavOutcome {
    Completed,
    /// The target was already current; only `on_refresh` ran.
    Refreshed,
    Ignored(IgnoreReason),
    /// Aborted; the stack is as it was before the request.
    Failed(NavigationError),
}

impl NavOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NavOutcome::Completed)
    }
}

/// Published on the router's [`EventBus`], in this order per navigation:
/// `TransitionStart`, at most one of the stack notifications, `TransitionEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    TransitionStart(ScreenId),
    ScreenPushed(ScreenId),
    ScreenPopped(ScreenId),
    ScreenReplaced {
        from: Option<ScreenId>,
        to: ScreenId,
    },
    NavigatedHome,
    TransitionEnd(ScreenId),
}

// ============================================================================
// NavigationTicket
// ============================================================================

/// Holds the router in `Transitioning` for as long as it lives.
pub(crate) struct NavigationTicket {
    flag: Rc<Cell<bool>>,
}

impl NavigationTicket {
    fn claim(flag: &Rc<Cell<bool>>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self { flag: flag.clone() })
    }
}

impl Drop for NavigationTicket {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

// ============================================================================
// Router
// ============================================================================

#[derive(Default)]
struct RouterState {
    /// Bottom → top.
    stack: Vec<ScreenHandle>,
    /// One live instance per screen id.
    instances: HashMap<ScreenId, ScreenHandle>,
    /// Parent id → ids of instantiated children.
    children: HashMap<ScreenId, BTreeSet<ScreenId>>,
    /// Ids whose creation is in progress.
    creating: HashSet<ScreenId>,
    transitions: HashMap<ScreenId, Rc<dyn ScreenTransition>>,
}

pub struct Router {
    registry: Registry,
    factory: Box<dyn ScreenFactory>,
    catalog: TransitionCatalog,
    default_config: TransitionConfig,
    default_transition: OnceCell<Rc<dyn ScreenTransition>>,
    home: ScreenId,
    bus: EventBus,
    contexts: ContextAllocator,
    next_instance: Cell<u64>,
    next_z: Cell<u64>,
    transitioning: Rc<Cell<bool>>,
    state: RefCell<RouterState>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("home", &self.home)
            .field("transitioning", &self.transitioning.get())
            .field("stack", &self.stack_screen_ids())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Home defaults to the first root screen in the registry.
    pub fn new(registry: Registry, factory: impl ScreenFactory + 'static) -> Self {
        let home = registry
            .children_of(None)
            .into_iter()
            .next()
            .unwrap_or_default();

        Self {
            registry,
            factory: Box::new(factory),
            catalog: TransitionCatalog::new(),
            default_config: TransitionConfig::default(),
            default_transition: OnceCell::new(),
            home,
            bus: EventBus::new(),
            contexts: ContextAllocator::new(),
            next_instance: Cell::new(0),
            next_z: Cell::new(0),
            transitioning: Rc::new(Cell::new(false)),
            state: RefCell::new(RouterState::default()),
        }
    }

    pub fn with_home(mut self, home: impl Into<ScreenId>) -> Self {
        self.home = home.into();
        self
    }

    /// Transition used by screens that declare none of their own.
    pub fn with_default_transition(mut self, config: TransitionConfig) -> Self {
        self.default_config = config;
        self.default_transition = OnceCell::new();
        self
    }

    pub fn with_catalog(mut self, catalog: TransitionCatalog) -> Self {
        self.catalog = catalog;
        self.default_transition = OnceCell::new();
        self
    }

    /// Shares an existing bus instead of the router's own.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn is_transitioning(&self) -> bool {
        self.transitioning.get()
    }

    pub fn stack_depth(&self) -> usize {
        self.state.borrow().stack.len()
    }

    pub fn current_screen(&self) -> Option<ScreenHandle> {
        self.state.borrow().stack.last().cloned()
    }

    pub fn is_in_stack(&self, id: &str) -> bool {
        self.state.borrow().stack.iter().any(|s| s.id() == id)
    }

    /// Stack ids, bottom → top.
    pub fn stack_screen_ids(&self) -> Vec<ScreenId> {
        self.state
            .borrow()
            .stack
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }

    /// The kept-alive instance for `id`, if its config retains one and it
    /// has been built.
    pub fn cached_screen(&self, id: &str) -> Option<ScreenHandle> {
        let retains = self
            .registry
            .get_config(id)
            .is_ok_and(|c| c.retains_instance());
        if !retains {
            return None;
        }
        self.screen(id)
    }

    /// Live instances built under `parent_id`, in id order.
    pub fn child_screens(&self, parent_id: &str) -> Vec<ScreenHandle> {
        let state = self.state.borrow();
        state
            .children
            .get(parent_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.instances.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The live instance for `id`, cached or transient.
    pub fn screen(&self, id: &str) -> Option<ScreenHandle> {
        self.state.borrow().instances.get(id).cloned()
    }

    pub fn home_screen_id(&self) -> &str {
        &self.home
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Observes [`RouterEvent`]s until the subscription is dropped.
    pub fn subscribe(&self, handler: impl Fn(&RouterEvent) + 'static) -> Subscription {
        self.bus.subscribe(handler)
    }

    // ── Entry points ────────────────────────────────────────────────────────

    pub async fn push(&self, id: &str, param: Option<NavParam>) -> NavOutcome {
        self.dispatch(NavCommand::Push {
            screen: id.to_string(),
            param,
        })
        .await
    }

    pub async fn pop(&self) -> NavOutcome {
        self.dispatch(NavCommand::Pop).await
    }

    pub async fn pop_to_root(&self) -> NavOutcome {
        self.dispatch(NavCommand::PopToRoot).await
    }

    pub async fn replace(&self, id: &str, param: Option<NavParam>) -> NavOutcome {
        self.dispatch(NavCommand::Replace {
            screen: id.to_string(),
            param,
        })
        .await
    }

    pub async fn navigate_home(&self, param: Option<NavParam>) -> NavOutcome {
        self.dispatch(NavCommand::Home { param }).await
    }

    pub async fn navigate_to(&self, id: &str, param: Option<NavParam>) -> NavOutcome {
        self.dispatch(NavCommand::NavigateTo {
            screen: id.to_string(),
            param,
        })
        .await
    }

    /// Runs `command` to completion. The busy check happens on first poll.
    pub async fn dispatch(&self, command: NavCommand) -> NavOutcome {
        match self.admit(&command) {
            Ok(ticket) => self.execute(ticket, command).await,
            Err(reason) => NavOutcome::Ignored(reason),
        }
    }

    /// Synchronous trigger: claims the router now and spawns the sequence on
    /// the current `LocalSet`. `None` means the request was dropped.
    ///
    /// # Panics
    ///
    /// Outside a [`tokio::task::LocalSet`], like `spawn_local` itself.
    pub fn request(self: &Rc<Self>, command: NavCommand) -> Option<JoinHandle<NavOutcome>> {
        let ticket = self.admit(&command).ok()?;
        let router = Rc::clone(self);
        Some(tokio::task::spawn_local(async move {
            router.execute(ticket, command).await
        }))
    }

    /// Exits the stack, destroys every live instance, and drops every bus
    /// handler. The router is empty afterwards.
    pub fn shutdown(&self) {
        let stack = std::mem::take(&mut self.state.borrow_mut().stack);
        for screen in stack.iter().rev() {
            screen.exit();
        }
        let mut live: Vec<ScreenHandle> =
            self.state.borrow().instances.values().cloned().collect();
        // Children before parents, then creation order.
        live.sort_by_key(|n| (std::cmp::Reverse(self.depth_of(n.id())), n.instance()));
        for node in &live {
            self.destroy_instance(node);
        }
        self.state.borrow_mut().transitions.clear();
        self.bus.clear();
        info!("Router shut down, {} instance(s) destroyed", live.len());
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn admit(&self, command: &NavCommand) -> Result<NavigationTicket, IgnoreReason> {
        let verdict = self.check(command);
        let verdict = verdict.and_then(|()| {
            NavigationTicket::claim(&self.transitioning).ok_or(IgnoreReason::Busy)
        });
        if let Err(reason) = verdict {
            match reason {
                IgnoreReason::Busy | IgnoreReason::AlreadyInStack => {
                    warn!("Dropping '{}': {}", command, reason)
                }
                _ => debug!("Ignoring '{}': {}", command, reason),
            }
        }
        verdict
    }

    fn check(&self, command: &NavCommand) -> Result<(), IgnoreReason> {
        if self.is_transitioning() {
            return Err(IgnoreReason::Busy);
        }
        if command.target().is_some_and(|id| id.trim().is_empty()) {
            return Err(IgnoreReason::EmptyId);
        }
        match command {
            NavCommand::Pop if self.stack_depth() <= 1 => Err(IgnoreReason::AtRoot),
            NavCommand::Push { screen, .. } if self.is_in_stack(screen) => {
                Err(IgnoreReason::AlreadyInStack)
            }
            NavCommand::Replace { screen, .. }
                if self.is_in_stack(screen) && !self.is_current(screen) =>
            {
                Err(IgnoreReason::AlreadyInStack)
            }
            NavCommand::Home { .. } | NavCommand::PopToRoot if self.home.is_empty() => {
                Err(IgnoreReason::EmptyId)
            }
            _ => Ok(()),
        }
    }

    async fn execute(&self, ticket: NavigationTicket, command: NavCommand) -> NavOutcome {
        // Re-navigating to the current screen is a refresh, not a navigation.
        if let NavCommand::NavigateTo { screen, param } = &command {
            if let Some(current) = self.current_screen().filter(|c| c.id() == screen.as_str()) {
                current.refresh(param.as_ref());
                return NavOutcome::Refreshed;
            }
        }

        let subject = match command.target() {
            Some(id) => id.to_string(),
            None if matches!(command, NavCommand::Pop) => self
                .current_screen()
                .map(|s| s.id().to_string())
                .unwrap_or_default(),
            None => self.home.clone(),
        };

        self.emit(RouterEvent::TransitionStart(subject.clone()));
        let result = match command {
            NavCommand::Push { screen, param } => self.push_sequence(&screen, param).await,
            NavCommand::Pop => self.pop_sequence().await,
            NavCommand::Replace { screen, param } => {
                self.replace_sequence(&screen, param).await
            }
            NavCommand::Home { param } => self.home_sequence(param).await,
            NavCommand::PopToRoot => self.home_sequence(None).await,
            NavCommand::NavigateTo { screen, param } => {
                self.navigate_to_sequence(&screen, param).await
            }
        };

        // Anything built for an aborted navigation and not kept by policy goes.
        self.sweep_transients();

        let outcome = match result {
            Ok(outcome) => {
                info!("Navigation to '{}' done, stack: {:?}", subject, self.stack_screen_ids());
                outcome
            }
            Err(e) => {
                error!("Navigation to '{}' aborted: {}", subject, e);
                NavOutcome::Failed(e)
            }
        };
        self.emit(RouterEvent::TransitionEnd(subject));
        drop(ticket);
        outcome
    }

    fn emit(&self, event: RouterEvent) {
        debug!("{:?}", event);
        self.bus.publish(&event);
    }

    fn is_current(&self, id: &str) -> bool {
        self.state
            .borrow()
            .stack
            .last()
            .is_some_and(|s| s.id() == id)
    }

    fn default_transition(&self) -> Rc<dyn ScreenTransition> {
        self.default_transition
            .get_or_init(|| self.catalog.build(&self.default_config))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ScreenConfig;
    use crate::test_support::{Journal, gated_router, recording_router};
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready};

    fn router(journal: &Journal) -> Rc<Router> {
        recording_router(
            vec![
                ScreenConfig::new("Home", "rec").cached(),
                ScreenConfig::new("Settings", "rec"),
            ],
            journal,
        )
    }

    #[test]
    fn test_ticket_releases_on_drop() {
        let flag = Rc::new(Cell::new(false));
        let ticket = NavigationTicket::claim(&flag).unwrap();
        assert!(flag.get());
        assert!(NavigationTicket::claim(&flag).is_none());
        drop(ticket);
        assert!(!flag.get());
    }

    #[test]
    fn test_home_defaults_to_first_root() {
        let journal = Journal::default();
        assert_eq!(router(&journal).home_screen_id(), "Home");
    }

    #[tokio::test]
    async fn test_empty_id_is_ignored() {
        let journal = Journal::default();
        let router = router(&journal);
        assert_eq!(
            router.push("", None).await,
            NavOutcome::Ignored(IgnoreReason::EmptyId)
        );
        assert_eq!(router.stack_depth(), 0);
        assert!(journal.entries().is_empty());
    }

    #[tokio::test]
    async fn test_pop_at_root_is_ignored() {
        let journal = Journal::default();
        let router = router(&journal);
        assert!(router.navigate_home(None).await.is_completed());
        assert_eq!(router.pop().await, NavOutcome::Ignored(IgnoreReason::AtRoot));
        assert_eq!(router.stack_depth(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_push_is_ignored() {
        let journal = Journal::default();
        let router = router(&journal);
        router.navigate_home(None).await;
        router.push("Settings", None).await;
        assert_eq!(
            router.push("Home", None).await,
            NavOutcome::Ignored(IgnoreReason::AlreadyInStack)
        );
        assert_eq!(router.stack_screen_ids(), vec!["Home", "Settings"]);
    }

    #[tokio::test]
    async fn test_events_bracket_each_navigation() {
        let journal = Journal::default();
        let router = router(&journal);
        let seen: Rc<RefCell<Vec<RouterEvent>>> = Rc::default();
        let seen_clone = seen.clone();
        let _sub = router.subscribe(move |e| seen_clone.borrow_mut().push(e.clone()));

        router.navigate_home(None).await;
        router.push("Settings", None).await;
        router.pop().await;

        assert_eq!(
            *seen.borrow(),
            vec![
                RouterEvent::TransitionStart("Home".into()),
                RouterEvent::NavigatedHome,
                RouterEvent::TransitionEnd("Home".into()),
                RouterEvent::TransitionStart("Settings".into()),
                RouterEvent::ScreenPushed("Settings".into()),
                RouterEvent::TransitionEnd("Settings".into()),
                RouterEvent::TransitionStart("Settings".into()),
                RouterEvent::ScreenPopped("Settings".into()),
                RouterEvent::TransitionEnd("Settings".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_push_dropped_while_first_in_flight() {
        let journal = Journal::default();
        let gate = Rc::new(Notify::new());
        let router = gated_router(
            vec![
                ScreenConfig::new("Home", "rec"),
                ScreenConfig::new("A", "rec"),
                ScreenConfig::new("B", "rec"),
            ],
            &journal,
            gate.clone(),
        );
        gate.notify_one();
        assert!(router.navigate_home(None).await.is_completed());

        let mut first = tokio_test::task::spawn(router.push("A", None));
        assert_pending!(first.poll());
        assert!(router.is_transitioning());
        assert_eq!(
            router.push("B", None).await,
            NavOutcome::Ignored(IgnoreReason::Busy)
        );

        gate.notify_one();
        assert!(first.is_woken());
        let outcome = assert_ready!(first.poll());
        assert!(outcome.is_completed());
        assert_eq!(router.stack_screen_ids(), vec!["Home", "A"]);
        assert!(router.screen("B").is_none());
    }

    #[tokio::test]
    async fn test_request_claims_synchronously() {
        let journal = Journal::default();
        let router = router(&journal);
        let local = tokio::task::LocalSet::new();

        local
            .run_until(async {
                let first = router.request(NavCommand::home());
                assert!(first.is_some());
                assert!(router.is_transitioning());
                assert!(router.request(NavCommand::push("Settings")).is_none());

                let outcome = first.unwrap().await.unwrap();
                assert!(outcome.is_completed());
                assert!(!router.is_transitioning());
            })
            .await;

        assert_eq!(router.stack_screen_ids(), vec!["Home"]);
    }

    #[tokio::test]
    async fn test_shutdown_destroys_everything() {
        let journal = Journal::default();
        let router = router(&journal);
        router.navigate_home(None).await;
        router.push("Settings", None).await;
        journal.clear();

        router.shutdown();
        assert_eq!(router.stack_depth(), 0);
        assert!(router.screen("Home").is_none());
        assert_eq!(
            journal.entries(),
            vec![
                "Settings:exit",
                "Home:exit",
                "Home:destroy",
                "Settings:destroy"
            ]
        );
    }
}
