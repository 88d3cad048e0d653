//! Screen router library exports
//!
//! A stack-based navigation runtime for hierarchical screens. The
//! [`Router`] owns the navigation stack and the live screen instances,
//! resolves parent chains from the [`Registry`], drives lifecycle hooks on
//! [`Screen`] implementations, and plays [`ScreenTransition`]s between them.
//!
//! Everything runs on a single thread. Spawned navigations need a
//! `tokio::task::LocalSet`.

pub mod controls;
pub mod core;
pub mod events;
pub mod router;
pub mod screen;
pub mod transition;

#[cfg(test)]
pub mod test_support;

pub use crate::core::error::{BuildError, NavigationError, RegistryError};
pub use crate::core::registry::{Registry, ScreenConfig, ScreenId};
pub use events::{EventBus, Subscription};
pub use router::{IgnoreReason, NavCommand, NavOutcome, Router, RouterEvent};
pub use screen::context::ScreenContext;
pub use screen::factory::{FactoryRegistry, ScreenFactory};
pub use screen::{NavParam, Screen, ScreenHandle, ScreenNode};
pub use transition::{ScreenTransition, TransitionCatalog, TransitionConfig, TransitionKind};
