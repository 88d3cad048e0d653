use std::rc::Rc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use crate::router::{NavCommand, NavOutcome, Router};

/// Issues a command on its own, optionally after a delay. Splash screens
/// and timed hand-offs use this.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoNavigate {
    pub command: NavCommand,
    pub delay: Duration,
}

impl AutoNavigate {
    pub fn new(command: NavCommand) -> Self {
        Self {
            command,
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Waits out the delay, then dispatches. The router may still drop the
    /// command if another navigation is running by then.
    pub async fn run(&self, router: &Router) -> NavOutcome {
        if !self.delay.is_zero() {
            debug!("Auto-navigating '{}' in {:?}", self.command, self.delay);
            tokio::time::sleep(self.delay).await;
        }
        router.dispatch(self.command.clone()).await
    }

    /// Runs on the current `LocalSet`.
    pub fn spawn(self, router: &Rc<Router>) -> JoinHandle<NavOutcome> {
        let router = Rc::clone(router);
        tokio::task::spawn_local(async move { self.run(&router).await })
    }
}
