//! Instance bookkeeping and the structural invariants.
//!
//! None of these suspend. Every `RefCell` borrow of router state is released
//! before a lifecycle hook runs, since hooks may query the router.

use std::cmp::Reverse;
use std::rc::Rc;

use log::{debug, error, warn};

use super::Router;
use crate::core::error::NavigationError;
use crate::core::registry::{ScreenConfig, ScreenId};
use crate::screen::context::ScreenContext;
use crate::screen::{InstanceId, ScreenHandle, ScreenNode};
use crate::transition::ScreenTransition;

impl Router {
    // ── Resolution ──────────────────────────────────────────────────────────

    /// Returns the live instance for `id`, building it (and its parents)
    /// when there is none.
    pub(super) fn resolve_screen(&self, id: &str) -> Result<ScreenHandle, NavigationError> {
        let live = self.state.borrow().instances.get(id).cloned();
        if let Some(node) = live {
            return Ok(node);
        }

        let config = self.registry.get_config(id)?.clone();
        if !self.state.borrow_mut().creating.insert(config.id.clone()) {
            error!("Screen '{}' re-entered its own creation", id);
            return Err(NavigationError::CircularDependency(config.id));
        }
        let built = self.create_screen(&config);
        self.state.borrow_mut().creating.remove(&config.id);
        built
    }

    fn create_screen(&self, config: &ScreenConfig) -> Result<ScreenHandle, NavigationError> {
        let parent = match config.parent_id.as_deref() {
            Some(parent_id) => Some(self.resolve_screen(parent_id)?),
            None => None,
        };

        // Children join their parent's scope; roots open a new one.
        let context_id = match &parent {
            Some(p) => p.context_id(),
            None => self.contexts.allocate(),
        };

        let screen = self
            .factory
            .build(config, parent.as_deref())
            .map_err(|source| NavigationError::Build {
                screen: config.id.clone(),
                source,
            })?;

        let instance = InstanceId(self.next_instance.get() + 1);
        self.next_instance.set(instance.0);

        let node = Rc::new(ScreenNode::new(
            config.id.clone(),
            instance,
            config.parent_slot.clone(),
            config.overlay,
            ScreenContext::new(config.id.clone(), context_id, self.bus.clone()),
            screen,
        ));
        debug!(
            "Created '{}' {} in {}{}",
            config.id,
            instance,
            context_id,
            parent
                .as_ref()
                .map(|p| format!(" under '{}'", p.id()))
                .unwrap_or_default()
        );

        {
            let mut state = self.state.borrow_mut();
            state.instances.insert(config.id.clone(), node.clone());
            if let Some(parent_id) = &config.parent_id {
                state
                    .children
                    .entry(parent_id.clone())
                    .or_default()
                    .insert(config.id.clone());
            }
        }

        node.create();
        self.rebind_children(&node);
        Ok(node)
    }

    /// Kept-alive children that outlived an earlier instance of `node`'s
    /// screen move into the new instance's scope.
    fn rebind_children(&self, node: &ScreenNode) {
        let scope = node.context_id();
        for child in self.child_screens(node.id()) {
            if child.context_id() != scope {
                debug!("Rebinding '{}' to {}", child.id(), scope);
                child.rebind_context(scope);
                self.rebind_children(&child);
            }
        }
    }

    // ── Lookups ─────────────────────────────────────────────────────────────

    fn live_roots(&self) -> Vec<ScreenHandle> {
        let state = self.state.borrow();
        let mut roots: Vec<ScreenHandle> = state
            .instances
            .values()
            .filter(|n| self.registry.get_config(n.id()).is_ok_and(|c| c.is_root()))
            .cloned()
            .collect();
        roots.sort_by_key(|n| n.instance());
        roots
    }

    pub(super) fn top(&self) -> Option<ScreenHandle> {
        self.current_screen()
    }

    pub(super) fn depth_of(&self, id: &str) -> usize {
        self.registry
            .hierarchy_path(id)
            .map(|path| path.len())
            .unwrap_or(1)
    }

    fn retains(&self, id: &str) -> bool {
        self.registry
            .get_config(id)
            .is_ok_and(|c| c.retains_instance())
    }

    /// Whether some stack entry other than `id` itself nests under `id`.
    pub(super) fn has_stack_descendant(&self, id: &str) -> bool {
        let stack: Vec<ScreenId> = self.stack_screen_ids();
        stack.iter().filter(|s| s.as_str() != id).any(|s| {
            self.registry
                .hierarchy_path(s)
                .is_ok_and(|path| path.iter().any(|p| p == id))
        })
    }

    // ── Activation ──────────────────────────────────────────────────────────

    /// Instantiates and shows every ancestor on `path` (root first, target
    /// last). Ancestors are shown in their resting state without `on_enter`.
    pub(super) fn ensure_ancestors_active(&self, path: &[ScreenId]) -> Result<(), NavigationError> {
        let Some((_, ancestors)) = path.split_last() else {
            return Ok(());
        };
        for id in ancestors {
            let node = self.resolve_screen(id)?;
            if !node.is_active() {
                debug!("Activating ancestor '{}'", id);
                node.set_active(true);
                let z = self.bump_z();
                node.update_visual(|v| {
                    v.reset();
                    v.z_order = z;
                });
            }
        }
        Ok(())
    }

    /// Activates `node` on top of everything and applies the pre-enter
    /// baseline. Returns the transition to play it in with.
    pub(super) fn prepare(&self, node: &ScreenNode) -> Rc<dyn ScreenTransition> {
        let transition = self.transition_for(node);
        node.set_active(true);
        let z = self.bump_z();
        node.update_visual(|v| v.z_order = z);
        transition.prepare_enter(node);
        transition
    }

    pub(super) async fn play_in(&self, node: &ScreenNode, transition: &Rc<dyn ScreenTransition>) {
        transition.transition_in(node).await;
        transition.finalize_enter(node);
    }

    fn bump_z(&self) -> u64 {
        let z = self.next_z.get() + 1;
        self.next_z.set(z);
        z
    }

    /// Along `target`'s path, deactivates every other active non-overlay
    /// sibling subtree. Overlay levels claim nothing.
    pub(super) fn enforce_exclusivity(&self, target: &ScreenNode) {
        let path = match self.registry.hierarchy_path(target.id()) {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping exclusivity for '{}': {}", target.id(), e);
                return;
            }
        };

        for id in &path {
            let Some(node) = self.screen(id) else {
                continue;
            };
            if node.is_overlay() {
                continue;
            }
            let parent = self
                .registry
                .get_config(id)
                .ok()
                .and_then(|c| c.parent_id.clone());
            let siblings = match parent.as_deref() {
                Some(parent_id) => self.child_screens(parent_id),
                None => self.live_roots(),
            };
            for sibling in siblings {
                if sibling.id() != id && !sibling.is_overlay() && sibling.is_active() {
                    debug!("'{}' hides sibling '{}'", id, sibling.id());
                    self.deactivate_subtree(&sibling);
                }
            }
        }
    }

    fn deactivate_subtree(&self, node: &ScreenNode) {
        for child in self.child_screens(node.id()) {
            self.deactivate_subtree(&child);
        }
        node.set_active(false);
    }

    // ── Teardown ────────────────────────────────────────────────────────────

    /// Takes a screen that just left the stack out of view. Instances kept
    /// by policy, or still holding up an on-stack descendant, are hidden;
    /// everything else is destroyed. Off-stack children go first.
    pub(super) fn release(&self, node: &ScreenHandle) {
        for child in self.child_screens(node.id()) {
            if !self.is_in_stack(child.id()) && !self.has_stack_descendant(child.id()) {
                self.release(&child);
            }
        }

        node.set_active(false);
        if self.retains(node.id()) {
            debug!("Keeping '{}' {} hidden", node.id(), node.instance());
            return;
        }
        if self.has_stack_descendant(node.id()) {
            debug!("'{}' still parents a stack entry, hiding", node.id());
            return;
        }
        self.destroy_instance(node);
    }

    /// Destroys transient instances that ended up inactive, off the stack,
    /// and parenting nothing on it. Deepest first.
    pub(super) fn sweep_transients(&self) {
        let mut idle: Vec<ScreenHandle> = self
            .state
            .borrow()
            .instances
            .values()
            .filter(|n| !n.is_active())
            .cloned()
            .collect();
        idle.retain(|n| {
            !self.retains(n.id()) && !self.is_in_stack(n.id()) && !self.has_stack_descendant(n.id())
        });
        idle.sort_by_key(|n| (Reverse(self.depth_of(n.id())), n.instance()));

        for node in &idle {
            self.destroy_instance(node);
        }
    }

    pub(super) fn destroy_instance(&self, node: &ScreenHandle) {
        node.destroy();

        let mut state = self.state.borrow_mut();
        let id = node.id();
        if state
            .instances
            .get(id)
            .is_some_and(|live| Rc::ptr_eq(live, node))
        {
            state.instances.remove(id);
        }
        let parent = self
            .registry
            .get_config(id)
            .ok()
            .and_then(|c| c.parent_id.as_deref());
        if let Some(parent_id) = parent {
            if let Some(siblings) = state.children.get_mut(parent_id) {
                siblings.remove(id);
                if siblings.is_empty() {
                    state.children.remove(parent_id);
                }
            }
        }
        state.transitions.remove(id);
        debug!("Destroyed '{}' {}", id, node.instance());
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Screen override, then the registry entry, then the router default.
    /// Cached per id for screens whose config retains the instance.
    pub(super) fn transition_for(&self, node: &ScreenNode) -> Rc<dyn ScreenTransition> {
        let cached = self.state.borrow().transitions.get(node.id()).cloned();
        if let Some(transition) = cached {
            return transition;
        }

        let config = self.registry.get_config(node.id()).ok();
        let declared = node
            .transition_override()
            .or_else(|| config.and_then(|c| c.transition.clone()));
        let transition = match declared {
            Some(cfg) => self.catalog.build(&cfg),
            None => self.default_transition(),
        };

        if config.is_some_and(|c| c.retains_instance()) {
            self.state
                .borrow_mut()
                .transitions
                .insert(node.id().to_string(), transition.clone());
        }
        transition
    }
}
