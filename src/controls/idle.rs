//! Returns the UI to a resting screen after a stretch without input.
//!
//! [`IdleTimer`] is a plain accumulator: the host feeds it elapsed time and
//! input notifications, and it answers with the command to issue when the
//! timeout is reached. [`IdleTimer::watch`] wires that to a tokio clock and
//! an input channel.

use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::core::registry::ScreenId;
use crate::router::{NavCommand, Router};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdleAction {
    /// `navigate-to` the screen, reusing its stack slot if it has one.
    NavigateTo(ScreenId),
    /// Unwind to the router's home screen.
    Home,
}

#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    action: IdleAction,
    idle: Duration,
    running: bool,
}

impl IdleTimer {
    /// Starts running immediately.
    pub fn new(timeout: Duration, action: IdleAction) -> Self {
        Self {
            timeout,
            action,
            idle: Duration::ZERO,
            running: true,
        }
    }

    pub fn start(&mut self) {
        self.idle = Duration::ZERO;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// User input seen; the countdown starts over.
    pub fn input(&mut self) {
        self.idle = Duration::ZERO;
    }

    pub fn idle_time(&self) -> Duration {
        self.idle
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.idle)
    }

    /// Adds `elapsed` idle time. Once the timeout is reached the counter
    /// resets and the command to issue is returned, unless the router is
    /// busy or already showing the target.
    pub fn tick(&mut self, elapsed: Duration, router: &Router) -> Option<NavCommand> {
        if !self.running {
            return None;
        }
        self.idle += elapsed;
        if self.idle < self.timeout {
            return None;
        }
        self.idle = Duration::ZERO;
        self.on_timeout(router)
    }

    /// Fires regardless of the accumulated time.
    pub fn force_timeout(&mut self, router: &Router) -> Option<NavCommand> {
        self.idle = Duration::ZERO;
        self.on_timeout(router)
    }

    fn on_timeout(&self, router: &Router) -> Option<NavCommand> {
        if router.is_transitioning() {
            debug!("Idle timeout while navigating, skipped");
            return None;
        }
        let target = match &self.action {
            IdleAction::NavigateTo(id) => id.as_str(),
            IdleAction::Home => router.home_screen_id(),
        };
        if router
            .current_screen()
            .is_some_and(|current| current.id() == target)
        {
            debug!("Idle timeout, already on '{}'", target);
            return None;
        }

        info!("Idle timeout after {:?}, going to '{}'", self.timeout, target);
        Some(match &self.action {
            IdleAction::NavigateTo(id) => NavCommand::navigate_to(id.clone()),
            IdleAction::Home => NavCommand::home(),
        })
    }

    /// Drives the timer off the tokio clock until `input` closes. Every
    /// message on `input` counts as user activity.
    pub async fn watch(mut self, router: &Router, mut input: mpsc::Receiver<()>) {
        let frame = Duration::from_millis(100);
        let mut ticker = interval(frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                received = input.recv() => match received {
                    Some(()) => self.input(),
                    None => break,
                },
                _ = ticker.tick() => {
                    if let Some(command) = self.tick(frame, router) {
                        router.dispatch(command).await;
                    }
                }
            }
        }
        debug!("Idle watch stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ScreenConfig;
    use crate::test_support::{Journal, recording_router};
    use std::rc::Rc;

    fn kiosk(journal: &Journal) -> Rc<Router> {
        recording_router(
            vec![
                ScreenConfig::new("Attract", "rec"),
                ScreenConfig::new("Menu", "rec"),
                ScreenConfig::new("Detail", "rec"),
            ],
            journal,
        )
    }

    #[tokio::test]
    async fn test_fires_after_timeout_and_resets() {
        let journal = Journal::default();
        let router = kiosk(&journal);
        router.navigate_home(None).await;
        router.push("Menu", None).await;

        let mut timer = IdleTimer::new(Duration::from_secs(30), IdleAction::Home);
        assert_eq!(timer.tick(Duration::from_secs(20), &router), None);
        assert_eq!(timer.remaining(), Duration::from_secs(10));
        assert_eq!(
            timer.tick(Duration::from_secs(10), &router),
            Some(NavCommand::home())
        );
        assert_eq!(timer.idle_time(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_input_restarts_countdown() {
        let journal = Journal::default();
        let router = kiosk(&journal);
        router.navigate_home(None).await;
        router.push("Menu", None).await;

        let mut timer = IdleTimer::new(Duration::from_secs(5), IdleAction::NavigateTo("Attract".into()));
        timer.tick(Duration::from_secs(4), &router);
        timer.input();
        assert_eq!(timer.tick(Duration::from_secs(4), &router), None);
        assert_eq!(
            timer.tick(Duration::from_secs(1), &router),
            Some(NavCommand::navigate_to("Attract"))
        );
    }

    #[tokio::test]
    async fn test_silent_when_already_on_target_or_stopped() {
        let journal = Journal::default();
        let router = kiosk(&journal);
        router.navigate_home(None).await;

        let mut timer = IdleTimer::new(Duration::from_secs(1), IdleAction::Home);
        assert_eq!(timer.force_timeout(&router), None);

        router.push("Menu", None).await;
        timer.stop();
        assert_eq!(timer.tick(Duration::from_secs(5), &router), None);
        timer.start();
        assert!(timer.force_timeout(&router).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_returns_home_on_the_clock() {
        let journal = Journal::default();
        let router = kiosk(&journal);
        router.navigate_home(None).await;
        router.push("Menu", None).await;
        router.push("Detail", None).await;

        let (tx, rx) = mpsc::channel(4);
        let timer = IdleTimer::new(Duration::from_secs(3), IdleAction::Home);
        let watching = timer.watch(&router, rx);
        let driver = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send(()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            assert_eq!(router.stack_depth(), 3);
            tokio::time::sleep(Duration::from_secs(2)).await;
            assert_eq!(router.stack_screen_ids(), vec!["Attract"]);
            drop(tx);
        };
        tokio::join!(watching, driver);
    }
}
