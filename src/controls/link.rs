//! A navigation button's behavior, minus the button.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::core::registry::ScreenId;
use crate::router::{NavCommand, NavOutcome, Router};
use crate::screen::NavParam;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationKind {
    #[default]
    Push,
    Pop,
    Replace,
    Home,
    NavigateTo,
}

impl NavigationKind {
    pub fn needs_target(self) -> bool {
        matches!(
            self,
            NavigationKind::Push | NavigationKind::Replace | NavigationKind::NavigateTo
        )
    }
}

/// What activating a link does: a navigation kind, a target for the kinds
/// that take one, and an optional param.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NavigationLink {
    #[serde(default)]
    pub kind: NavigationKind,
    #[serde(default)]
    pub target: ScreenId,
    #[serde(default)]
    pub param: Option<NavParam>,
}

impl NavigationLink {
    pub fn new(kind: NavigationKind, target: impl Into<ScreenId>) -> Self {
        Self {
            kind,
            target: target.into(),
            param: None,
        }
    }

    pub fn push(target: impl Into<ScreenId>) -> Self {
        Self::new(NavigationKind::Push, target)
    }

    pub fn with_param(mut self, param: NavParam) -> Self {
        self.param = Some(param);
        self
    }

    pub fn set_target(&mut self, target: impl Into<ScreenId>) {
        self.target = target.into();
    }

    pub fn set_param(&mut self, param: NavParam) {
        self.param = Some(param);
    }

    /// `None` when the kind needs a target and none is set.
    pub fn command(&self) -> Option<NavCommand> {
        if self.kind.needs_target() && self.target.trim().is_empty() {
            return None;
        }
        let screen = self.target.clone();
        let param = self.param.clone();
        Some(match self.kind {
            NavigationKind::Push => NavCommand::Push { screen, param },
            NavigationKind::Pop => NavCommand::Pop,
            NavigationKind::Replace => NavCommand::Replace { screen, param },
            NavigationKind::Home => NavCommand::Home { param },
            NavigationKind::NavigateTo => NavCommand::NavigateTo { screen, param },
        })
    }

    /// Fire-and-forget activation, as a click handler would do it.
    pub fn activate(&self, router: &Rc<Router>) -> Option<JoinHandle<NavOutcome>> {
        router.request(self.command()?)
    }

    /// Activates and waits for the navigation to finish.
    pub async fn follow(&self, router: &Router) -> Option<NavOutcome> {
        let command = self.command()?;
        Some(router.dispatch(command).await)
    }
}
