use std::cell::Cell;
use std::rc::{Rc, Weak};

use tokio::task::JoinHandle;

use crate::events::Subscription;
use crate::router::{NavCommand, NavOutcome, Router, RouterEvent};

/// Pops the stack when pressed. Tracks whether there is anything to pop so
/// a host can hide the button at the root.
pub struct BackButton {
    router: Weak<Router>,
    hide_at_root: bool,
    can_go_back: Rc<Cell<bool>>,
    _watch: Subscription,
}

impl BackButton {
    pub fn attach(router: &Rc<Router>, hide_at_root: bool) -> Self {
        let can_go_back = Rc::new(Cell::new(router.stack_depth() > 1));
        let weak = Rc::downgrade(router);
        let watch = {
            let can_go_back = can_go_back.clone();
            let weak = weak.clone();
            router.subscribe(move |event: &RouterEvent| {
                if matches!(event, RouterEvent::TransitionStart(_)) {
                    return;
                }
                if let Some(router) = weak.upgrade() {
                    can_go_back.set(router.stack_depth() > 1);
                }
            })
        };

        Self {
            router: weak,
            hide_at_root,
            can_go_back,
            _watch: watch,
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.hide_at_root || self.can_go_back.get()
    }

    pub fn is_interactable(&self) -> bool {
        self.can_go_back.get()
    }

    pub fn press(&self) -> Option<JoinHandle<NavOutcome>> {
        self.router.upgrade()?.request(NavCommand::Pop)
    }
}
