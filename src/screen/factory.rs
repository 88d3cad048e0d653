//! # Screen Factory
//!
//! The router never knows how a screen is built; it hands the registry entry
//! (and the parent instance, for nested screens) to a [`ScreenFactory`].
//!
//! [`FactoryRegistry`] is the stock implementation: builder closures keyed by
//! the config's `factory` string, with an optional fallback for keys nobody
//! registered.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::core::error::BuildError;
use crate::core::registry::ScreenConfig;
use crate::screen::{Screen, ScreenNode};

pub trait ScreenFactory {
    /// Builds the screen described by `config`. `parent` is the live parent
    /// instance when the config names one.
    fn build(
        &self,
        config: &ScreenConfig,
        parent: Option<&ScreenNode>,
    ) -> Result<Box<dyn Screen>, BuildError>;
}

impl<F> ScreenFactory for F
where
    F: Fn(&ScreenConfig, Option<&ScreenNode>) -> Result<Box<dyn Screen>, BuildError>,
{
    fn build(
        &self,
        config: &ScreenConfig,
        parent: Option<&ScreenNode>,
    ) -> Result<Box<dyn Screen>, BuildError> {
        self(config, parent)
    }
}

pub type ScreenBuilder =
    Box<dyn Fn(&ScreenConfig, Option<&ScreenNode>) -> Result<Box<dyn Screen>, BuildError>>;

#[derive(Default)]
pub struct FactoryRegistry {
    builders: HashMap<String, ScreenBuilder>,
    fallback: Option<ScreenBuilder>,
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.builders.keys().collect();
        keys.sort();
        f.debug_struct("FactoryRegistry")
            .field("keys", &keys)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a builder under `key`, replacing any earlier one.
    pub fn register<F>(&mut self, key: impl Into<String>, builder: F) -> &mut Self
    where
        F: Fn(&ScreenConfig, Option<&ScreenNode>) -> Result<Box<dyn Screen>, BuildError> + 'static,
    {
        self.builders.insert(key.into(), Box::new(builder));
        self
    }

    pub fn with<F>(mut self, key: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&ScreenConfig, Option<&ScreenNode>) -> Result<Box<dyn Screen>, BuildError> + 'static,
    {
        self.register(key, builder);
        self
    }

    /// Used for any key without its own builder.
    pub fn with_fallback<F>(mut self, builder: F) -> Self
    where
        F: Fn(&ScreenConfig, Option<&ScreenNode>) -> Result<Box<dyn Screen>, BuildError> + 'static,
    {
        self.fallback = Some(Box::new(builder));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.builders.contains_key(key)
    }
}

impl ScreenFactory for FactoryRegistry {
    fn build(
        &self,
        config: &ScreenConfig,
        parent: Option<&ScreenNode>,
    ) -> Result<Box<dyn Screen>, BuildError> {
        match self.builders.get(&config.factory) {
            Some(builder) => builder(config, parent),
            None => match &self.fallback {
                Some(fallback) => {
                    debug!("No builder for '{}', using fallback", config.factory);
                    fallback(config, parent)
                }
                None => Err(BuildError::UnknownFactory(config.factory.clone())),
            },
        }
    }
}
