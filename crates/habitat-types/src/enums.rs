//! Enumeration types for the habitat simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Operating status of a piece of life-support equipment.
///
/// Only [`EquipmentStatus::On`] equipment does work or draws power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EquipmentStatus {
    /// Running normally.
    On,
    /// Switched off.
    Off,
    /// Damaged and unable to run until repaired.
    Broken,
    /// Taken offline for servicing.
    Maintenance,
}

impl EquipmentStatus {
    /// Whether the equipment is running.
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Control mode of the humidity regulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum HumidityMode {
    /// Forced on.
    On,
    /// Forced off.
    Off,
    /// Regulates toward the target humidity.
    Auto,
}

/// State of the cargo bay door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum DoorStatus {
    /// Closed and pressure sealed.
    Sealed,
    /// Closed but not sealed.
    Unsealed,
    /// Open to the bay.
    Open,
}

// ---------------------------------------------------------------------------
// Survivor
// ---------------------------------------------------------------------------

/// Consciousness state of the survivor.
///
/// Variants are ordered from best to worst. Transitions only move toward
/// worse states; nothing in the engine heals the survivor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum HealthStatus {
    /// Awake and responsive.
    Conscious,
    /// Impaired but responsive.
    Dizzy,
    /// Not responsive.
    Unconscious,
    /// Game over.
    Dead,
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// The verb of a structured player intent.
///
/// Produced by the interpretation layer from free text. Anything the
/// interpreter cannot classify arrives as [`ActionType::Unknown`], which
/// the engine treats as a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionType {
    /// Walk somewhere.
    Move,
    /// Manipulate an object (open, press, connect, flip).
    Interact,
    /// Use or combine an inventory item.
    UseItem,
    /// Look at or search something.
    Examine,
    /// Talk over the radio.
    Communicate,
    /// Do nothing for a while.
    Wait,
    /// Abort the current activity.
    Cancel,
    /// Could not be classified.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ActionType {
    /// The wire name of this action (`use_item`, `examine`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Interact => "interact",
            Self::UseItem => "use_item",
            Self::Examine => "examine",
            Self::Communicate => "communicate",
            Self::Wait => "wait",
            Self::Cancel => "cancel",
            Self::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_status_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&EquipmentStatus::Maintenance).ok();
        assert_eq!(json.as_deref(), Some("\"maintenance\""));
    }

    #[test]
    fn health_status_orders_best_to_worst() {
        assert!(HealthStatus::Conscious < HealthStatus::Dizzy);
        assert!(HealthStatus::Dizzy < HealthStatus::Unconscious);
        assert!(HealthStatus::Unconscious < HealthStatus::Dead);
    }

    #[test]
    fn unrecognized_action_deserializes_as_unknown() {
        let parsed: Result<ActionType, _> = serde_json::from_str("\"dance\"");
        assert_eq!(parsed.ok(), Some(ActionType::Unknown));
    }

    #[test]
    fn action_display_matches_serde() {
        for action in [ActionType::UseItem, ActionType::Examine, ActionType::Wait] {
            let json = serde_json::to_string(&action).unwrap_or_default();
            assert_eq!(json, format!("\"{action}\""));
        }
    }
}
