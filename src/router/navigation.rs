//! The navigation sequences.
//!
//! Each runs with the router already claimed and returns what `execute`
//! reports. A sequence that fails must leave the stack as it found it; the
//! only await points are transition phases.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, warn};

use super::{NavOutcome, Router, RouterEvent};
use crate::core::error::NavigationError;
use crate::core::registry::ScreenId;
use crate::screen::{NavParam, ScreenHandle};

impl Router {
    pub(super) async fn push_sequence(
        &self,
        id: &str,
        param: Option<NavParam>,
    ) -> Result<NavOutcome, NavigationError> {
        let path = self.registry.hierarchy_path(id)?;
        let target = self.resolve_screen(id)?;
        self.ensure_ancestors_active(&path)?;

        if let Some(current) = self.top() {
            current.pause();
            // A nested child renders over its still-visible parent; so does
            // anything over which an overlay opens.
            let nested = path.iter().any(|p| p == current.id());
            if nested || target.is_overlay() {
                debug!("'{}' stays visible under '{}'", current.id(), id);
            } else {
                let exit = self.transition_for(&current);
                exit.transition_out(&current).await;
                current.set_active(false);
            }
        }

        let enter = self.prepare(&target);
        target.enter(param.as_ref());
        self.play_in(&target, &enter).await;

        self.state.borrow_mut().stack.push(target.clone());
        self.settle(&target);
        self.emit(RouterEvent::ScreenPushed(id.to_string()));
        Ok(NavOutcome::Completed)
    }

    pub(super) async fn pop_sequence(&self) -> Result<NavOutcome, NavigationError> {
        let Some(top) = self.state.borrow_mut().stack.pop() else {
            return Ok(NavOutcome::Completed);
        };

        let exit = self.transition_for(&top);
        top.exit();
        exit.transition_out(&top).await;
        self.release(&top);

        if let Some(next) = self.top() {
            self.reveal(&next).await;
            next.resume();
            self.settle(&next);
        }

        self.emit(RouterEvent::ScreenPopped(top.id().to_string()));
        Ok(NavOutcome::Completed)
    }

    pub(super) async fn replace_sequence(
        &self,
        id: &str,
        param: Option<NavParam>,
    ) -> Result<NavOutcome, NavigationError> {
        let previous = self.state.borrow_mut().stack.pop();

        let resolved = self
            .registry
            .hierarchy_path(id)
            .map_err(NavigationError::from)
            .and_then(|path| self.resolve_screen(id).map(|next| (path, next)))
            .and_then(|(path, next)| {
                self.ensure_ancestors_active(&path)?;
                Ok((path, next))
            });
        let (path, next) = match resolved {
            Ok(found) => found,
            Err(e) => {
                // Not partially committed: the popped screen goes back.
                if let Some(previous) = previous {
                    self.state.borrow_mut().stack.push(previous);
                }
                return Err(e);
            }
        };

        if let Some(previous) = previous.as_ref().filter(|p| Rc::ptr_eq(p, &next)) {
            self.state.borrow_mut().stack.push(previous.clone());
            previous.refresh(param.as_ref());
            return Ok(NavOutcome::Refreshed);
        }

        let enter = self.prepare(&next);
        match &previous {
            Some(previous) => {
                previous.exit();
                next.enter(param.as_ref());
                if path.iter().any(|p| p == previous.id()) {
                    // Replacing a screen with its own descendant keeps it up.
                    self.play_in(&next, &enter).await;
                } else {
                    let exit = self.transition_for(previous);
                    futures::join!(
                        exit.transition_out(previous),
                        self.play_in(&next, &enter)
                    );
                    self.release(previous);
                }
            }
            None => {
                next.enter(param.as_ref());
                self.play_in(&next, &enter).await;
            }
        }

        self.state.borrow_mut().stack.push(next.clone());
        self.settle(&next);
        self.emit(RouterEvent::ScreenReplaced {
            from: previous.map(|p| p.id().to_string()),
            to: id.to_string(),
        });
        Ok(NavOutcome::Completed)
    }

    /// Unwinds the whole stack and leaves home as its only entry. Home is
    /// resolved before anything is torn down, so a failure changes nothing.
    pub(super) async fn home_sequence(
        &self,
        param: Option<NavParam>,
    ) -> Result<NavOutcome, NavigationError> {
        let home_id = self.home.clone();
        let path = self.registry.hierarchy_path(&home_id)?;
        let home = self.resolve_screen(&home_id)?;
        let keep: HashSet<&str> = path.iter().map(ScreenId::as_str).collect();

        let unwound = std::mem::take(&mut self.state.borrow_mut().stack);
        // Only the visible top animates out; the rest are just hidden.
        for (depth, screen) in unwound.iter().enumerate().rev() {
            screen.exit();
            if depth + 1 == unwound.len() {
                let exit = self.transition_for(screen);
                exit.transition_out(screen).await;
            }
            screen.set_active(false);
        }
        // Every entry has exited before any is released; a parent above its
        // own child on the stack cascades into it.
        for screen in unwound.iter().rev() {
            if !keep.contains(screen.id()) && !screen.is_destroyed() {
                self.release(screen);
            }
        }

        if let Err(e) = self.ensure_ancestors_active(&path) {
            warn!("Home '{}' shown without its ancestors: {}", home_id, e);
        }
        let enter = self.prepare(&home);
        home.enter(param.as_ref());
        self.play_in(&home, &enter).await;

        self.state.borrow_mut().stack.push(home.clone());
        self.settle(&home);
        self.emit(RouterEvent::NavigatedHome);
        Ok(NavOutcome::Completed)
    }

    /// Refreshing the current top is handled before the sequence starts.
    /// Deeper entries are reached by cheap pops; anything else is a push.
    pub(super) async fn navigate_to_sequence(
        &self,
        id: &str,
        param: Option<NavParam>,
    ) -> Result<NavOutcome, NavigationError> {
        if !self.is_in_stack(id) {
            return self.push_sequence(id, param).await;
        }

        while self.stack_depth() > 1 && !self.is_current(id) {
            let Some(top) = self.state.borrow_mut().stack.pop() else {
                break;
            };
            top.exit();
            top.set_active(false);
            self.release(&top);
            self.emit(RouterEvent::ScreenPopped(top.id().to_string()));
        }

        let Some(target) = self.top() else {
            return Ok(NavOutcome::Completed);
        };
        self.reveal(&target).await;
        target.resume();
        target.refresh(param.as_ref());
        self.settle(&target);
        Ok(NavOutcome::Completed)
    }

    // ── Shared steps ────────────────────────────────────────────────────────

    /// Plays a stack entry back in if something hid it while it was covered.
    async fn reveal(&self, screen: &ScreenHandle) {
        if screen.is_active() {
            return;
        }
        match self.registry.hierarchy_path(screen.id()) {
            Ok(path) => {
                if let Err(e) = self.ensure_ancestors_active(&path) {
                    warn!("'{}' revealed without its ancestors: {}", screen.id(), e);
                }
            }
            Err(e) => warn!("'{}' revealed without its ancestors: {}", screen.id(), e),
        }
        let enter = self.prepare(screen);
        self.play_in(screen, &enter).await;
    }

    /// Post-navigation invariants for the new top.
    fn settle(&self, top: &ScreenHandle) {
        self.enforce_exclusivity(top);
        self.sweep_transients();
    }
}
