//! # Errors
//!
//! Every failure the runtime can report. Configuration problems surface at
//! load time as [`ConfigIssue`] warnings; structural and resolution failures
//! surface at navigation time as [`NavigationError`] and abort only the
//! navigation that hit them.

use std::fmt;

use crate::core::registry::ScreenId;

// ============================================================================
// Registry
// ============================================================================

/// Errors raised while walking the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No valid entry is registered under this id.
    NotFound(ScreenId),
    /// Following `parent_id` links revisited a node. `path` holds the walk up
    /// to and including the repeated id.
    CircularDependency { path: Vec<ScreenId> },
    /// A `parent_id` points at an id that is not registered.
    MissingParent { screen: ScreenId, parent: ScreenId },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound(id) => write!(f, "no configuration found for screen `{id}`"),
            RegistryError::CircularDependency { path } => {
                write!(f, "circular parent chain: {}", path.join(" -> "))
            }
            RegistryError::MissingParent { screen, parent } => {
                write!(f, "screen `{screen}` names unknown parent `{parent}`")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// A problem found while validating registry entries. These are warnings:
/// the registry keeps loading and the offending entry is left out of lookups
/// (or, for cycles, refused by `hierarchy_path`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// Entry at `index` has an empty id.
    EmptyId { index: usize },
    /// Entry has no factory key, so nothing can build it.
    MissingFactory { id: ScreenId },
    /// A second entry reused an id. The first registration wins.
    Duplicate { id: ScreenId },
    /// `parent_id` names an id with no registry entry.
    UnknownParent { screen: ScreenId, parent: ScreenId },
    /// The parent chain starting at the first id loops back on itself.
    CircularParent { path: Vec<ScreenId> },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::EmptyId { index } => write!(f, "entry #{index} has an empty screen id"),
            ConfigIssue::MissingFactory { id } => write!(f, "screen `{id}` has no factory"),
            ConfigIssue::Duplicate { id } => write!(f, "duplicate screen id `{id}` ignored"),
            ConfigIssue::UnknownParent { screen, parent } => {
                write!(f, "screen `{screen}` names unknown parent `{parent}`")
            }
            ConfigIssue::CircularParent { path } => {
                write!(f, "circular parent chain: {}", path.join(" -> "))
            }
        }
    }
}

// ============================================================================
// Screen construction
// ============================================================================

/// The factory could not produce a usable screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No builder is registered for the factory key.
    UnknownFactory(String),
    /// The builder ran but rejected the configuration.
    Rejected(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownFactory(key) => write!(f, "no builder registered for factory `{key}`"),
            BuildError::Rejected(msg) => write!(f, "builder rejected screen: {msg}"),
        }
    }
}

impl std::error::Error for BuildError {}

// ============================================================================
// Navigation
// ============================================================================

/// Why a navigation was aborted. The stack is always left as it was before
/// the navigation began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Static registry walk failed (unknown id, cyclic or broken parent chain).
    Registry(RegistryError),
    /// A screen was asked for while its own creation was still in progress.
    CircularDependency(ScreenId),
    /// The factory produced nothing usable for this screen.
    Build { screen: ScreenId, source: BuildError },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Registry(e) => write!(f, "registry error: {e}"),
            NavigationError::CircularDependency(id) => {
                write!(f, "circular dependency while creating screen `{id}`")
            }
            NavigationError::Build { screen, source } => {
                write!(f, "failed to build screen `{screen}`: {source}")
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::Registry(e) => Some(e),
            NavigationError::Build { source, .. } => Some(source),
            NavigationError::CircularDependency(_) => None,
        }
    }
}

impl From<RegistryError> for NavigationError {
    fn from(e: RegistryError) -> Self {
        NavigationError::Registry(e)
    }
}
