//! Turns a [`TransitionConfig`] into a live transition.
//!
//! Built-in kinds need nothing registered. `custom` kinds are looked up by
//! name; an unknown name falls back to a default fade.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::warn;

use super::{
    ComboTransition, FadeTransition, InstantTransition, ScaleTransition, ScreenTransition,
    SlideTransition, TransitionConfig, TransitionKind,
};

pub type TransitionBuilder = Box<dyn Fn(&TransitionConfig) -> Rc<dyn ScreenTransition>>;

#[derive(Default)]
pub struct TransitionCatalog {
    custom: HashMap<String, TransitionBuilder>,
}

impl fmt::Debug for TransitionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("TransitionCatalog")
            .field("custom", &names)
            .finish()
    }
}

impl TransitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, builder: F) -> &mut Self
    where
        F: Fn(&TransitionConfig) -> Rc<dyn ScreenTransition> + 'static,
    {
        self.custom.insert(name.into(), Box::new(builder));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&TransitionConfig) -> Rc<dyn ScreenTransition> + 'static,
    {
        self.register(name, builder);
        self
    }

    pub fn build(&self, config: &TransitionConfig) -> Rc<dyn ScreenTransition> {
        match config.kind {
            TransitionKind::Fade => Rc::new(FadeTransition::from_config(config)),
            TransitionKind::Slide => Rc::new(SlideTransition::from_config(config)),
            TransitionKind::Scale => Rc::new(ScaleTransition::from_config(config)),
            TransitionKind::Combo => Rc::new(ComboTransition::from_config(config)),
            TransitionKind::Instant => Rc::new(InstantTransition),
            TransitionKind::Custom => {
                let name = config.custom.as_deref().unwrap_or_default();
                match self.custom.get(name) {
                    Some(builder) => builder(config),
                    None => {
                        warn!("Unknown custom transition '{}', falling back to fade", name);
                        Rc::new(FadeTransition::default())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::detached_node;

    #[tokio::test]
    async fn test_instant_kind_snaps_without_animation() {
        let catalog = TransitionCatalog::new();
        let transition = catalog.build(&TransitionConfig::instant());
        let node = detached_node("A");

        transition.prepare_enter(&node);
        assert!(!node.visual().interactable);
        transition.transition_in(&node).await;
        transition.finalize_enter(&node);
        assert!(node.visual().interactable);
        assert_eq!(node.visual().alpha, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_runs_alpha_through_full_range() {
        let transition = TransitionCatalog::new().build(&TransitionConfig::fade());
        let node = detached_node("A");

        transition.prepare_enter(&node);
        assert_eq!(node.visual().alpha, 0.0);
        transition.transition_in(&node).await;
        assert!((node.visual().alpha - 1.0).abs() < 1e-4);

        transition.finalize_enter(&node);
        transition.transition_out(&node).await;
        assert!(node.visual().alpha.abs() < 1e-4);
        assert!(!node.visual().interactable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slide_exits_opposite_direction() {
        let transition = TransitionCatalog::new().build(&TransitionConfig::slide([1.0, 0.0]));
        let node = detached_node("A");

        transition.prepare_enter(&node);
        assert_eq!(node.visual().offset, [1.0, 0.0]);
        transition.transition_in(&node).await;
        transition.finalize_enter(&node);
        assert_eq!(node.visual().offset, [0.0, 0.0]);

        transition.transition_out(&node).await;
        assert!((node.visual().offset[0] + 1.0).abs() < 1e-4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scale_and_combo_settle_at_rest() {
        let catalog = TransitionCatalog::new();
        for config in [TransitionConfig::scale(), TransitionConfig::combo()] {
            let transition = catalog.build(&config);
            let node = detached_node("A");
            transition.prepare_enter(&node);
            assert!(node.visual().scale < 1.0);
            transition.transition_in(&node).await;
            transition.finalize_enter(&node);
            assert_eq!(node.visual().scale, 1.0);
            assert_eq!(node.visual().alpha, 1.0);
        }
    }

    #[test]
    fn test_custom_name_resolves_registered_builder() {
        let shared: Rc<dyn ScreenTransition> = Rc::new(InstantTransition);
        let shared_clone = shared.clone();
        let catalog = TransitionCatalog::new().with("shared", move |_| shared_clone.clone());

        let built = catalog.build(&TransitionConfig::custom("shared"));
        assert!(Rc::ptr_eq(&built, &shared));
    }

    #[test]
    fn test_unknown_custom_falls_back() {
        let catalog = TransitionCatalog::new();
        // Must not panic; the fade fallback is returned.
        let _ = catalog.build(&TransitionConfig::custom("nope"));
    }
}
