use std::time::Duration;

use async_trait::async_trait;

use super::tween::animate;
use super::{Ease, ScreenTransition, TransitionConfig};
use crate::screen::ScreenNode;

/// Slides in from `from` (viewport fractions) and out the opposite way.
/// Opacity stays at 1 throughout.
#[derive(Debug, Clone)]
pub struct SlideTransition {
    pub enter: Duration,
    pub exit: Duration,
    pub enter_ease: Ease,
    pub exit_ease: Ease,
    pub from: [f32; 2],
}

impl SlideTransition {
    pub fn from_config(config: &TransitionConfig) -> Self {
        Self {
            enter: config.enter_duration(),
            exit: config.exit_duration(),
            enter_ease: config.enter_ease,
            exit_ease: config.exit_ease,
            from: config.slide_from,
        }
    }
}

#[async_trait(?Send)]
impl ScreenTransition for SlideTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.offset = self.from;
            v.alpha = 1.0;
            v.interactable = false;
        });
    }

    async fn transition_in(&self, screen: &ScreenNode) {
        let [fx, fy] = screen.visual().offset;
        animate(self.enter, |t| {
            let remaining = 1.0 - self.enter_ease.apply(t);
            screen.update_visual(|v| v.offset = [fx * remaining, fy * remaining]);
        })
        .await;
    }

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
        let [dx, dy] = self.from;
        animate(self.exit, |t| {
            let p = self.exit_ease.apply(t);
            screen.update_visual(|v| v.offset = [-dx * p, -dy * p]);
        })
        .await;
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.offset = [0.0, 0.0];
            v.interactable = true;
        });
    }
}
