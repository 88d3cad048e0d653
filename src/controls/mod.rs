//! # Navigation Controls
//!
//! Small behaviors that sit between input and the router. None of them draw
//! anything; a host binds them to its own buttons and timers.
//!
//! - [`NavigationLink`]: one configured navigation, fired on activation
//! - [`BackButton`]: pop, visible only when there is something to pop
//! - [`AutoNavigate`]: fires a command by itself after a delay
//! - [`IdleTimer`]: returns to a resting screen after inactivity

pub mod auto;
pub mod back;
pub mod idle;
pub mod link;

pub use auto::AutoNavigate;
pub use back::BackButton;
pub use idle::{IdleAction, IdleTimer};
pub use link::{NavigationKind, NavigationLink};
