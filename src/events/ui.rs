//! Scoped UI events screens publish to their own subtree.
//!
//! Each event carries the [`ContextId`] it was published under; subscribers
//! registered through a screen context only see events from their own scope
//! (or global ones).

use std::collections::BTreeMap;

use serde_json::Value;

use super::ContextEvent;
use crate::screen::context::ContextId;

macro_rules! context_event {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl ContextEvent for $ty {
                fn context_id(&self) -> ContextId {
                    self.context_id
                }

                fn set_context_id(&mut self, id: ContextId) {
                    self.context_id = id;
                }
            }
        )+
    };
}

/// Set the text of one label, addressed by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetLabel {
    pub context_id: ContextId,
    pub key: String,
    pub text: String,
}

/// Set several labels at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetLabels {
    pub context_id: ContextId,
    pub labels: BTreeMap<String, String>,
}

/// A keyed piece of screen data changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataChanged {
    pub context_id: ContextId,
    pub key: String,
    pub value: Value,
}

/// A named button was activated, with optional payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonClicked {
    pub context_id: ContextId,
    pub button: String,
    pub data: Option<String>,
}

/// Within `group`, keep only `active_keys` visible. Empty hides the group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivateOnlyInGroup {
    pub context_id: ContextId,
    pub group: String,
    pub active_keys: Vec<String>,
}

context_event!(SetLabel, SetLabels, DataChanged, ButtonClicked, ActivateOnlyInGroup);

impl ActivateOnlyInGroup {
    pub fn is_active(&self, key: &str) -> bool {
        self.active_keys.iter().any(|k| k == key)
    }
}
