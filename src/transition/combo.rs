use std::time::Duration;

use async_trait::async_trait;

use super::tween::{animate, lerp};
use super::{Ease, ScreenTransition, TransitionConfig};
use crate::screen::ScreenNode;

const ENTER_SCALE: f32 = 0.8;
const EXIT_SCALE: f32 = 1.1;
/// Entry rises from slightly below its resting place.
const RISE: f32 = 0.05;

/// Scale with bounce, a short rise, and a delayed fade. Exits by growing
/// slightly while fading.
#[derive(Debug, Clone)]
pub struct ComboTransition {
    pub enter: Duration,
    pub exit: Duration,
}

impl ComboTransition {
    pub fn from_config(config: &TransitionConfig) -> Self {
        Self {
            enter: config.enter_duration(),
            exit: config.exit_duration(),
        }
    }
}

#[async_trait(?Send)]
impl ScreenTransition for ComboTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| {
            v.scale = ENTER_SCALE;
            v.offset = [0.0, RISE];
            v.alpha = 0.0;
            v.interactable = false;
        });
    }

    async fn transition_in(&self, screen: &ScreenNode) {
        animate(self.enter, |t| {
            let scale = Ease::OutBack.apply(t);
            let rise = Ease::OutQuad.apply((t / 0.8).min(1.0));
            // Fade starts after 20% of the run and lasts 60% of it.
            let fade = ((t - 0.2) / 0.6).clamp(0.0, 1.0);
            screen.update_visual(|v| {
                v.scale = lerp(ENTER_SCALE, 1.0, scale);
                v.offset = [0.0, RISE * (1.0 - rise)];
                v.alpha = fade;
            });
        })
        .await;
    }

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
        animate(self.exit, |t| {
            let grow = Ease::InQuad.apply(t);
            let fade = Ease::InQuad.apply((t / 0.8).min(1.0));
            screen.update_visual(|v| {
                v.scale = lerp(1.0, EXIT_SCALE, grow);
                v.alpha = 1.0 - fade;
            });
        })
        .await;
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.reset());
    }
}
