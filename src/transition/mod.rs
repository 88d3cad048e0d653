//! # Transitions
//!
//! How a screen visually enters and leaves. The router treats a transition
//! as an opaque strategy with four phases per screen:
//!
//! ```text
//! prepare_enter ──► transition_in (async) ──► finalize_enter
//!                   transition_out (async)
//! ```
//!
//! `prepare_enter` sets the pre-animation baseline and makes the screen
//! non-interactive; `finalize_enter` snaps to the resting state and restores
//! interaction. The async phases suspend the navigation until the effect has
//! run. Transitions only touch a screen's [`VisualState`](crate::screen::VisualState).

pub mod catalog;
mod combo;
pub mod ease;
mod fade;
mod scale;
mod slide;
mod tween;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::screen::ScreenNode;

pub use catalog::TransitionCatalog;
pub use combo::ComboTransition;
pub use ease::Ease;
pub use fade::FadeTransition;
pub use scale::ScaleTransition;
pub use slide::SlideTransition;

#[async_trait(?Send)]
pub trait ScreenTransition {
    /// Pre-animation baseline. Marks the screen non-interactive.
    fn prepare_enter(&self, screen: &ScreenNode);

    /// Runs the enter effect. Returns once it has finished.
    async fn transition_in(&self, screen: &ScreenNode);

    /// Runs the exit effect. Returns once it has finished.
    async fn transition_out(&self, screen: &ScreenNode);

    /// Snaps to the final visual state and makes the screen interactive.
    fn finalize_enter(&self, screen: &ScreenNode);
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    Fade,
    Slide,
    Scale,
    Combo,
    Instant,
    /// Looked up by [`TransitionConfig::custom`] in a [`TransitionCatalog`].
    Custom,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub kind: TransitionKind,
    pub enter_ms: u64,
    pub exit_ms: u64,
    pub enter_ease: Ease,
    pub exit_ease: Ease,
    /// Slide start offset in viewport fractions; `[1, 0]` enters from the right.
    pub slide_from: [f32; 2],
    /// Starting scale for scale transitions.
    pub scale_from: f32,
    /// Catalog name for [`TransitionKind::Custom`].
    pub custom: Option<String>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Fade,
            enter_ms: 300,
            exit_ms: 200,
            enter_ease: Ease::OutQuad,
            exit_ease: Ease::InQuad,
            slide_from: [1.0, 0.0],
            scale_from: 0.8,
            custom: None,
        }
    }
}

impl TransitionConfig {
    pub fn fade() -> Self {
        Self::default()
    }

    pub fn slide(from: [f32; 2]) -> Self {
        Self {
            kind: TransitionKind::Slide,
            slide_from: from,
            ..Self::default()
        }
    }

    /// Scale defaults to the back curves, which give the entry a small bounce.
    pub fn scale() -> Self {
        Self {
            kind: TransitionKind::Scale,
            enter_ease: Ease::OutBack,
            exit_ease: Ease::InBack,
            ..Self::default()
        }
    }

    pub fn combo() -> Self {
        Self {
            kind: TransitionKind::Combo,
            enter_ms: 400,
            exit_ms: 300,
            ..Self::default()
        }
    }

    pub fn instant() -> Self {
        Self {
            kind: TransitionKind::Instant,
            enter_ms: 0,
            exit_ms: 0,
            ..Self::default()
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            kind: TransitionKind::Custom,
            custom: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_durations(mut self, enter_ms: u64, exit_ms: u64) -> Self {
        self.enter_ms = enter_ms;
        self.exit_ms = exit_ms;
        self
    }

    pub fn enter_duration(&self) -> Duration {
        Duration::from_millis(self.enter_ms)
    }

    pub fn exit_duration(&self) -> Duration {
        Duration::from_millis(self.exit_ms)
    }
}

// ============================================================================
// Instant
// ============================================================================

/// Shows and hides without animating.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantTransition;

#[async_trait(?Send)]
impl ScreenTransition for InstantTransition {
    fn prepare_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
    }

    async fn transition_in(&self, _screen: &ScreenNode) {}

    async fn transition_out(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.interactable = false);
    }

    fn finalize_enter(&self, screen: &ScreenNode) {
        screen.update_visual(|v| v.reset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_match_fade() {
        let cfg = TransitionConfig::default();
        assert_eq!(cfg.kind, TransitionKind::Fade);
        assert_eq!(cfg.enter_duration(), Duration::from_millis(300));
        assert_eq!(cfg.exit_duration(), Duration::from_millis(200));
    }

    #[test]
    fn test_sparse_toml_transition() {
        let cfg: TransitionConfig = toml::from_str(
            r#"
kind = "slide"
slide_from = [0.0, -1.0]
enter_ease = "out-cubic"
"#,
        )
        .unwrap();
        assert_eq!(cfg.kind, TransitionKind::Slide);
        assert_eq!(cfg.slide_from, [0.0, -1.0]);
        assert_eq!(cfg.enter_ease, Ease::OutCubic);
        assert_eq!(cfg.exit_ms, 200);
    }

    #[test]
    fn test_scale_uses_back_curves() {
        let cfg = TransitionConfig::scale();
        assert_eq!(cfg.enter_ease, Ease::OutBack);
        assert_eq!(cfg.exit_ease, Ease::InBack);
    }
}
