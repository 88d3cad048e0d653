use std::time::Duration;

use async_trait::async_trait;

use super::tween::{animate, lerp};
use super::{Ease, ScreenTransition, TransitionConfig};
use crate::screen::ScreenNode;

/// Grows from `from` while fading in; shrinks back while fading out.
#[derive(Debug, Clone)]
pub struct ScaleTransition {
    pub enter: Duration,
    pub exit: Duration,
    pub enter_ease: Ease,
    pub exit_ease: Ease,
    pub from: f32,
}

impl ScaleTransition {
    pub fn from_config(config: &TransitionConfig) -> Self {
        Self {
            enter: config.enter_duration(),
            exit: config.exit_duration(),
            enter_ease: config.enter_ease,
            exit_ease: config.exit_ease,
            from: config.scale_from,
        }
    }
}

#[async_trait(?Send)]
impl ScreenTransition for ScaleTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.scale = self.from;
            v.alpha = 0.0;
            v.interactable = false;
        });
    }

    async fn transition_in(&self, screen: &ScreenNode) {
        animate(self.enter, |t| {
            let p = self.enter_ease.apply(t);
            // Opacity finishes at 80% of the run.
            let fade = (t / 0.8).min(1.0);
            screen.update_visual(|v| {
                v.scale = lerp(self.from, 1.0, p);
                v.alpha = fade;
            });
        })
        .await;
    }

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
        animate(self.exit, |t| {
            let p = self.exit_ease.apply(t);
            screen.update_visual(|v| {
                v.scale = lerp(1.0, self.from, p);
                v.alpha = 1.0 - t;
            });
        })
        .await;
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.scale = 1.0;
            v.alpha = 1.0;
            v.interactable = true;
        });
    }
}
