//! Shared type definitions for the Mars habitat survival engine.
//!
//! This crate is the single source of truth for the world model, player
//! intents and telemetry. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the player HUD.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identified entities
//! - [`enums`] -- Equipment, health and action enumerations
//! - [`state`] -- The habitat world state and its sub-systems
//! - [`intent`] -- Structured player intents
//! - [`telemetry`] -- Rounded HUD projection of the state

pub mod enums;
pub mod ids;
pub mod intent;
pub mod state;
pub mod telemetry;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionType, DoorStatus, EquipmentStatus, HealthStatus, HumidityMode};
pub use ids::BreachId;
pub use intent::Intent;
pub use state::{
    AirCirculation, AntennaAngle, BackupBattery, Breach, CargoBayState, CircuitBreakers,
    Co2Scrubber, CommunicationsState, EnvironmentState, EventLog, EventRecord, HabitatState,
    Heater, HumidityControl, InventoryItem, LifeSupportState, MainBus, O2Generator,
    PowerSystemState, Receiver, SimulationMetadata, SolarPanels, SuitState, SurvivorState,
    Transmitter, Vitals,
};
pub use telemetry::Telemetry;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the HUD.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::BreachId::export_all();

        let _ = crate::enums::EquipmentStatus::export_all();
        let _ = crate::enums::HumidityMode::export_all();
        let _ = crate::enums::DoorStatus::export_all();
        let _ = crate::enums::HealthStatus::export_all();
        let _ = crate::enums::ActionType::export_all();

        let _ = crate::state::HabitatState::export_all();
        let _ = crate::intent::Intent::export_all();
        let _ = crate::telemetry::Telemetry::export_all();
    }
}
