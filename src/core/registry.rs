//! # Screen Registry
//!
//! Static lookup table from screen id to its [`ScreenConfig`]. Entries are
//! loaded once; invalid and duplicate entries are logged and skipped so a bad
//! row never takes the whole registry down.
//!
//! ```text
//! Registry
//! ├── order: Vec<ScreenId>                  // registration order of valid ids
//! ├── configs: HashMap<ScreenId, ScreenConfig>
//! └── rejected: Vec<ConfigIssue>            // what load-time filtering dropped
//! ```
//!
//! The parent graph (`parent_id` links) describes spatial nesting, not
//! navigation order. [`Registry::hierarchy_path`] walks it root-first and
//! refuses cycles instead of looping.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigIssue, RegistryError};
use crate::transition::TransitionConfig;

/// Unique key of a screen configuration.
pub type ScreenId = String;

// ============================================================================
// ScreenConfig
// ============================================================================

/// One registry entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScreenConfig {
    pub id: ScreenId,
    /// Key handed to the screen factory. How it builds is the host's business.
    #[serde(default)]
    pub factory: String,
    /// Never destroyed once created.
    #[serde(default)]
    pub persistent: bool,
    /// Kept alive (hidden) after leaving the stack.
    #[serde(default)]
    pub cache_after_first_use: bool,
    /// Always rebuilt. Wins over the two caching flags.
    #[serde(default)]
    pub destroy_on_deactivate: bool,
    /// Structural parent. `None` (or empty in TOML) means hierarchy root.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<ScreenId>,
    /// Named sub-location under the parent instance.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_slot: Option<String>,
    /// Declares the screen an overlay: pushing it never hides what is beneath.
    #[serde(default)]
    pub overlay: bool,
    /// Per-screen transition, used when the screen itself declares none.
    #[serde(default)]
    pub transition: Option<TransitionConfig>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

impl ScreenConfig {
    pub fn new(id: impl Into<ScreenId>, factory: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            factory: factory.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ScreenId>) -> Self {
        let parent = parent.into();
        self.parent_id = (!parent.is_empty()).then_some(parent);
        self
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.parent_slot = Some(slot.into());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn cached(mut self) -> Self {
        self.cache_after_first_use = true;
        self
    }

    pub fn destroy_on_deactivate(mut self) -> Self {
        self.destroy_on_deactivate = true;
        self
    }

    pub fn overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    pub fn with_transition(mut self, transition: TransitionConfig) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Applies the destroy-on-deactivate rule: it resets both caching flags.
    pub fn normalized(mut self) -> Self {
        if self.destroy_on_deactivate {
            self.persistent = false;
            self.cache_after_first_use = false;
        }
        self
    }

    /// A non-empty id and a build reference.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.factory.trim().is_empty()
    }

    /// True when the router keeps the instance after it leaves the stack.
    pub fn retains_instance(&self) -> bool {
        !self.destroy_on_deactivate && (self.persistent || self.cache_after_first_use)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct Registry {
    order: Vec<ScreenId>,
    configs: HashMap<ScreenId, ScreenConfig>,
    rejected: Vec<ConfigIssue>,
}

impl Registry {
    /// Builds the lookup table, dropping invalid entries and later duplicates.
    pub fn from_configs(entries: impl IntoIterator<Item = ScreenConfig>) -> Self {
        let mut registry = Registry::default();

        for (index, config) in entries.into_iter().enumerate() {
            let config = config.normalized();

            if config.id.trim().is_empty() {
                warn!("Registry entry #{} has an empty screen id, skipping", index);
                registry.rejected.push(ConfigIssue::EmptyId { index });
                continue;
            }
            if !config.is_valid() {
                warn!("Screen '{}' has no factory, skipping", config.id);
                registry.rejected.push(ConfigIssue::MissingFactory { id: config.id });
                continue;
            }
            if registry.configs.contains_key(&config.id) {
                warn!("Duplicate screen ID in registry: {}", config.id);
                registry.rejected.push(ConfigIssue::Duplicate { id: config.id });
                continue;
            }

            registry.order.push(config.id.clone());
            registry.configs.insert(config.id.clone(), config);
        }

        registry
    }

    /// Like [`Registry::from_configs`], then logs every structural issue.
    pub fn load(entries: impl IntoIterator<Item = ScreenConfig>) -> Self {
        let registry = Self::from_configs(entries);
        for issue in registry.validate() {
            if !registry.rejected.contains(&issue) {
                warn!("Registry: {}", issue);
            }
        }
        registry
    }

    pub fn get_config(&self, id: &str) -> Result<&ScreenConfig, RegistryError> {
        self.configs
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn has_screen(&self, id: &str) -> bool {
        self.configs.contains_key(id)
    }

    /// Valid ids in registration order.
    pub fn all_ids(&self) -> Vec<ScreenId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids whose config names `parent` as parent. `None` lists the roots.
    pub fn children_of(&self, parent: Option<&str>) -> Vec<ScreenId> {
        self.order
            .iter()
            .filter(|id| {
                self.configs
                    .get(*id)
                    .is_some_and(|c| c.parent_id.as_deref() == parent)
            })
            .cloned()
            .collect()
    }

    /// Ordered ids from the structural root down to `id`, inclusive.
    pub fn hierarchy_path(&self, id: &str) -> Result<Vec<ScreenId>, RegistryError> {
        let mut walk: Vec<ScreenId> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut cursor = self.get_config(id)?;

        loop {
            if !visited.insert(cursor.id.as_str()) {
                walk.push(cursor.id.clone());
                walk.reverse();
                return Err(RegistryError::CircularDependency { path: walk });
            }
            walk.push(cursor.id.clone());

            let Some(parent) = cursor.parent_id.as_deref() else {
                break;
            };
            cursor = self
                .configs
                .get(parent)
                .ok_or_else(|| RegistryError::MissingParent {
                    screen: cursor.id.clone(),
                    parent: parent.to_string(),
                })?;
        }

        walk.reverse();
        Ok(walk)
    }

    /// Everything load-time filtering dropped plus every broken parent chain.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.rejected.clone();
        let mut reported_cycles: HashSet<ScreenId> = HashSet::new();

        for id in &self.order {
            match self.hierarchy_path(id) {
                Ok(_) => {}
                Err(RegistryError::MissingParent { screen, parent }) => {
                    let issue = ConfigIssue::UnknownParent { screen, parent };
                    if !issues.contains(&issue) {
                        issues.push(issue);
                    }
                }
                Err(RegistryError::CircularDependency { path }) => {
                    // Every member of one loop yields the same cycle; report it once.
                    let members: Vec<ScreenId> = path.iter().skip(1).cloned().collect();
                    if members.iter().any(|m| reported_cycles.contains(m)) {
                        continue;
                    }
                    reported_cycles.extend(members);
                    issues.push(ConfigIssue::CircularParent { path });
                }
                Err(RegistryError::NotFound(_)) => {}
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(entries: Vec<ScreenConfig>) -> Registry {
        Registry::from_configs(entries)
    }

    #[test]
    fn test_destroy_on_deactivate_resets_cache_flags() {
        let config = ScreenConfig::new("A", "a")
            .persistent()
            .cached()
            .destroy_on_deactivate()
            .normalized();
        assert!(!config.persistent);
        assert!(!config.cache_after_first_use);
        assert!(!config.retains_instance());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let reg = registry(vec![
            ScreenConfig::new("Home", "first"),
            ScreenConfig::new("Home", "second"),
        ]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get_config("Home").unwrap().factory, "first");
        assert!(reg
            .validate()
            .contains(&ConfigIssue::Duplicate { id: "Home".into() }));
    }

    #[test]
    fn test_invalid_entries_excluded() {
        let reg = registry(vec![
            ScreenConfig::new("", "x"),
            ScreenConfig::new("NoFactory", ""),
            ScreenConfig::new("Ok", "ok"),
        ]);
        assert_eq!(reg.all_ids(), vec!["Ok".to_string()]);
        assert!(matches!(
            reg.get_config("NoFactory"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_hierarchy_path_is_root_first() {
        let reg = registry(vec![
            ScreenConfig::new("Tab", "tab"),
            ScreenConfig::new("SubTab", "sub").with_parent("Tab"),
            ScreenConfig::new("Leaf", "leaf").with_parent("SubTab"),
        ]);
        assert_eq!(
            reg.hierarchy_path("Leaf").unwrap(),
            vec!["Tab".to_string(), "SubTab".to_string(), "Leaf".to_string()]
        );
        assert_eq!(reg.hierarchy_path("Tab").unwrap(), vec!["Tab".to_string()]);
    }

    #[test]
    fn test_hierarchy_path_terminates_on_cycle() {
        let reg = registry(vec![
            ScreenConfig::new("A", "a").with_parent("B"),
            ScreenConfig::new("B", "b").with_parent("A"),
        ]);
        match reg.hierarchy_path("A") {
            Err(RegistryError::CircularDependency { path }) => {
                assert_eq!(path.first(), path.last());
                assert!(path.len() <= 3);
            }
            other => panic!("expected circular dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let reg = registry(vec![ScreenConfig::new("Loop", "l").with_parent("Loop")]);
        assert!(matches!(
            reg.hierarchy_path("Loop"),
            Err(RegistryError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_missing_parent_reported() {
        let reg = registry(vec![ScreenConfig::new("Orphan", "o").with_parent("Nowhere")]);
        assert_eq!(
            reg.hierarchy_path("Orphan"),
            Err(RegistryError::MissingParent {
                screen: "Orphan".into(),
                parent: "Nowhere".into()
            })
        );
    }

    #[test]
    fn test_validate_reports_cycle_once() {
        let reg = registry(vec![
            ScreenConfig::new("A", "a").with_parent("B"),
            ScreenConfig::new("B", "b").with_parent("A"),
            ScreenConfig::new("C", "c"),
        ]);
        let cycles: Vec<_> = reg
            .validate()
            .into_iter()
            .filter(|i| matches!(i, ConfigIssue::CircularParent { .. }))
            .collect();
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_children_of_lists_roots_and_children() {
        let reg = registry(vec![
            ScreenConfig::new("Home", "h"),
            ScreenConfig::new("Tab", "t"),
            ScreenConfig::new("SubA", "a").with_parent("Tab"),
            ScreenConfig::new("SubB", "b").with_parent("Tab"),
        ]);
        assert_eq!(reg.children_of(None), vec!["Home".to_string(), "Tab".to_string()]);
        assert_eq!(
            reg.children_of(Some("Tab")),
            vec!["SubA".to_string(), "SubB".to_string()]
        );
    }

    #[test]
    fn test_toml_entry_treats_empty_parent_as_root() {
        let config: ScreenConfig = toml::from_str(
            r#"
id = "Home"
factory = "home"
parent_id = ""
cache_after_first_use = true
"#,
        )
        .unwrap();
        assert!(config.is_root());
        assert!(config.retains_instance());
    }
}
