use std::time::Duration;

use async_trait::async_trait;

use super::tween::{animate, lerp};
use super::{Ease, ScreenTransition, TransitionConfig};
use crate::screen::ScreenNode;

/// Cross-fades opacity.
#[derive(Debug, Clone)]
pub struct FadeTransition {
    pub enter: Duration,
    pub exit: Duration,
    pub enter_ease: Ease,
    pub exit_ease: Ease,
}

impl Default for FadeTransition {
    fn default() -> Self {
        Self::from_config(&TransitionConfig::fade())
    }
}

impl FadeTransition {
    pub fn from_config(config: &TransitionConfig) -> Self {
        Self {
            enter: config.enter_duration(),
            exit: config.exit_duration(),
            enter_ease: config.enter_ease,
            exit_ease: config.exit_ease,
        }
    }
}

#[async_trait(?Send)]
impl ScreenTransition for FadeTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.alpha = 0.0;
            v.interactable = false;
        });
    }

    async fn transition_in(&self, screen: &ScreenNode) {
        let from = screen.visual().alpha;
        animate(self.enter, |t| {
            let p = self.enter_ease.apply(t);
            screen.update_visual(|v| v.alpha = lerp(from, 1.0, p));
        })
        .await;
    }

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
        let from = screen.visual().alpha;
        animate(self.exit, |t| {
            let p = self.exit_ease.apply(t);
            screen.update_visual(|v| v.alpha = lerp(from, 0.0, p));
        })
        .await;
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.alpha = 1.0;
            v.interactable = true;
        });
    }
}
