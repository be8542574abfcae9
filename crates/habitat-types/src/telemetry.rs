//! Rounded telemetry projection of the habitat state.
//!
//! This is what the HUD shows. Values are rounded once here so every
//! consumer (WebSocket stream, REST endpoint, dialogue prompts) sees the
//! same numbers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::state::HabitatState;

/// Headline readings for the player HUD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Telemetry {
    /// CO2 in percent, three decimals.
    pub co2: f64,
    /// Temperature in degrees Celsius, one decimal.
    pub temp: f64,
    /// Pressure in kPa, one decimal.
    pub pressure: f64,
    /// Oxygen in percent, one decimal.
    pub o2: f64,
    /// Heart rate in whole beats per minute.
    pub heart_rate: u32,
    /// Stress in percent, one decimal.
    pub stress: f64,
    /// Battery state of charge in percent, one decimal.
    pub battery: f64,
    /// Total electrical load in watts, one decimal.
    pub power_draw: f64,
    /// Display names of carried items, in pickup order.
    pub inventory: Vec<String>,
}

impl Telemetry {
    /// Project the state into rounded telemetry.
    pub fn from_state(state: &HabitatState) -> Self {
        let env = &state.environment;
        Self {
            co2: round_to(env.co2_level, 3),
            temp: round_to(env.temperature, 1),
            pressure: round_to(env.pressure, 1),
            o2: round_to(env.oxygen_level, 1),
            heart_rate: whole_bpm(state.survivor.vitals.heart_rate),
            stress: round_to(state.survivor.stress_level, 1),
            battery: round_to(state.power.battery.charge_percent(), 1),
            power_draw: round_to(state.power.total_load, 1),
            inventory: state
                .survivor
                .inventory
                .iter()
                .map(|item| item.name.clone())
                .collect(),
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a heart rate to whole beats, saturating at the `u32` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn whole_bpm(heart_rate: f64) -> u32 {
    // `as` saturates for floats; NaN maps to zero.
    heart_rate.round().clamp(0.0, f64::from(u32::MAX)) as u32
}
