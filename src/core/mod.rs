//! # Core Definitions
//!
//! The static side of the router: what screens exist, how they nest, and
//! how loading them can go wrong. Nothing in here is live or async.
//!
//! ```text
//!     router.toml ──► config ──► ResolvedConfig
//!                                     │
//!                                     ▼
//!                         ┌───────────────────────┐
//!                         │       Registry        │
//!                         │  id → ScreenConfig    │
//!                         │  parent links, paths  │
//!                         └───────────┬───────────┘
//!                                     │
//!                                     ▼
//!                                  Router
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: `ScreenConfig` entries and hierarchy lookups
//! - [`config`]: TOML loading and override resolution
//! - [`error`]: error types shared by the registry and the router

pub mod config;
pub mod error;
pub mod registry;
