//! Structured player intents.
//!
//! The interpretation layer turns free text ("search the shelf") into an
//! [`Intent`]. The engine only ever sees intents; it never parses text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ActionType;

/// A classified player action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Intent {
    /// What the player wants to do.
    pub action: ActionType,
    /// The object the action is aimed at. Empty when there is none.
    #[serde(default)]
    pub target: String,
    /// Extra free-form arguments.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Intent {
    /// Create an intent with no parameters.
    pub fn new(action: ActionType, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// The intent produced when input cannot be classified.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether this intent was classified at all.
    pub const fn is_unknown(&self) -> bool {
        matches!(self.action, ActionType::Unknown)
    }

    /// Attach a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}
