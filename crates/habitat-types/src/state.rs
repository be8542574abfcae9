//! The habitat world state.
//!
//! [`HabitatState`] is the single mutable world model: atmosphere, power,
//! life support, the survivor's body, communications, cargo and the event
//! log. It carries no behavior beyond small invariant-preserving helpers;
//! the physics and scenario layers in `habitat-core` mutate it.
//!
//! The engine holds the only live instance. Everything handed to
//! collaborators is a clone or a [`crate::Telemetry`] projection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DoorStatus, EquipmentStatus, HealthStatus, HumidityMode};
use crate::ids::BreachId;

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Complete state of the habitat and its survivor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HabitatState {
    /// Tick bookkeeping and active scenario.
    pub metadata: SimulationMetadata,
    /// Atmosphere and thermal state.
    pub environment: EnvironmentState,
    /// Electrical supply.
    pub power: PowerSystemState,
    /// Consumables and life-support equipment.
    pub life_support: LifeSupportState,
    /// The survivor (Jack).
    pub survivor: SurvivorState,
    /// Radio equipment.
    pub communications: CommunicationsState,
    /// Cargo bay.
    pub cargo_bay: CargoBayState,
    /// Scripted and simulated event history.
    pub events: EventLog,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Simulation bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationMetadata {
    /// Number of physics steps taken. Increments by exactly one per step.
    pub tick_count: u64,
    /// Simulated seconds elapsed.
    pub elapsed_seconds: f64,
    /// Wall-clock time of the last tick, if any.
    pub last_update: Option<DateTime<Utc>>,
    /// Identifier of the loaded scenario (`default` when none).
    pub scenario_id: String,
}

impl Default for SimulationMetadata {
    fn default() -> Self {
        Self {
            tick_count: 0,
            elapsed_seconds: 0.0,
            last_update: None,
            scenario_id: String::from("default"),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A hole in the hull leaking atmosphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Breach {
    /// Breach identifier.
    pub id: BreachId,
    /// Where the breach is.
    pub location: String,
    /// Hole diameter in millimetres.
    pub size_mm: f64,
    /// Whether the breach has been patched.
    pub sealed: bool,
}

impl Breach {
    /// Create a new unsealed breach.
    pub fn new(location: impl Into<String>, size_mm: f64) -> Self {
        Self {
            id: BreachId::new(),
            location: location.into(),
            size_mm,
            sealed: false,
        }
    }
}

/// Habitat atmosphere and thermal state.
///
/// `oxygen_level` and `co2_level` stay within `[0, 100]`; `pressure`
/// never drops below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnvironmentState {
    /// Oxygen fraction in percent.
    pub oxygen_level: f64,
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Cabin pressure in kPa.
    pub pressure: f64,
    /// Carbon dioxide fraction in percent.
    pub co2_level: f64,
    /// Radiation dose rate in mSv/h.
    pub radiation: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Pressurized volume in cubic metres.
    pub volume: f64,
    /// Structural integrity in percent.
    pub hull_integrity: f64,
    /// Known hull breaches.
    pub breaches: Vec<Breach>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            oxygen_level: 21.0,
            temperature: 22.0,
            pressure: 101.325,
            co2_level: 0.04,
            radiation: 0.0,
            humidity: 50.0,
            volume: 500.0,
            hull_integrity: 100.0,
            breaches: Vec::new(),
        }
    }
}

impl EnvironmentState {
    /// Partial pressure of oxygen in kPa.
    pub fn oxygen_partial_pressure(&self) -> f64 {
        self.pressure * (self.oxygen_level / 100.0)
    }

    /// Number of breaches still leaking.
    pub fn unsealed_breaches(&self) -> usize {
        self.breaches.iter().filter(|b| !b.sealed).count()
    }
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// The main distribution bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MainBus {
    /// Whether the bus is energized.
    pub online: bool,
    /// Nominal bus voltage.
    pub voltage: f64,
    /// Current draw in amperes.
    pub current_draw: f64,
    /// Rated capacity in watts.
    pub max_capacity: f64,
}

impl Default for MainBus {
    fn default() -> Self {
        Self {
            online: true,
            voltage: 28.0,
            current_draw: 0.0,
            max_capacity: 5000.0,
        }
    }
}

/// Backup battery bank.
///
/// `charge_wh` stays within `[0, capacity_wh]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BackupBattery {
    /// Stored energy in watt-hours.
    pub charge_wh: f64,
    /// Maximum storable energy in watt-hours.
    pub capacity_wh: f64,
    /// Battery health in percent.
    pub health: f64,
    /// Pack temperature in degrees Celsius.
    pub temperature: f64,
}

impl Default for BackupBattery {
    fn default() -> Self {
        Self {
            charge_wh: 2000.0,
            capacity_wh: 2000.0,
            health: 100.0,
            temperature: 25.0,
        }
    }
}

impl BackupBattery {
    /// State of charge in percent. An empty bank reports zero.
    pub fn charge_percent(&self) -> f64 {
        if self.capacity_wh <= 0.0 {
            return 0.0;
        }
        (self.charge_wh / self.capacity_wh) * 100.0
    }
}

/// Solar array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SolarPanels {
    /// Whether the array is connected.
    pub online: bool,
    /// Conversion efficiency in percent.
    pub efficiency: f64,
    /// Tilt angle in degrees.
    pub angle_degrees: f64,
    /// Current output in watts.
    pub output_watts: f64,
    /// Dust coverage in percent.
    pub dust_coverage: f64,
}

impl Default for SolarPanels {
    fn default() -> Self {
        Self {
            online: true,
            efficiency: 85.0,
            angle_degrees: 45.0,
            output_watts: 3500.0,
            dust_coverage: 15.0,
        }
    }
}

/// Breaker positions for the habitat circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CircuitBreakers {
    /// Life-support circuit closed.
    pub life_support: bool,
    /// Communications circuit closed.
    pub communications: bool,
    /// Lighting circuit closed.
    pub lighting: bool,
    /// Auxiliary circuit closed.
    pub auxiliary: bool,
}

impl Default for CircuitBreakers {
    fn default() -> Self {
        Self {
            life_support: true,
            communications: true,
            lighting: true,
            auxiliary: true,
        }
    }
}

/// Electrical supply state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PowerSystemState {
    /// Main distribution bus.
    pub main_bus: MainBus,
    /// Backup battery bank.
    pub battery: BackupBattery,
    /// Solar array.
    pub solar_panels: SolarPanels,
    /// Breaker panel.
    pub circuit_breakers: CircuitBreakers,
    /// Total electrical load computed on the last step, in watts.
    pub total_load: f64,
}

impl PowerSystemState {
    /// Whether powered equipment can run (main bus energized).
    pub const fn has_power(&self) -> bool {
        self.main_bus.online
    }
}

// ---------------------------------------------------------------------------
// Life support
// ---------------------------------------------------------------------------

/// Carbon dioxide scrubber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Co2Scrubber {
    /// Operating status.
    pub status: EquipmentStatus,
    /// Remaining filter life in percent.
    pub filter_life_percent: f64,
    /// CO2 removed per minute, in percentage points.
    pub scrub_rate: f64,
    /// Electrical draw in watts while on.
    pub power_draw: f64,
}

impl Default for Co2Scrubber {
    fn default() -> Self {
        Self {
            status: EquipmentStatus::On,
            filter_life_percent: 100.0,
            scrub_rate: 0.5,
            power_draw: 200.0,
        }
    }
}

/// Oxygen generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct O2Generator {
    /// Operating status.
    pub status: EquipmentStatus,
    /// O2 added per minute, in percentage points.
    pub output_rate: f64,
    /// Feedstock reservoir pressure in kPa.
    pub reservoir_pressure: f64,
    /// Electrical draw in watts while on.
    pub power_draw: f64,
}

impl Default for O2Generator {
    fn default() -> Self {
        Self {
            status: EquipmentStatus::On,
            output_rate: 0.3,
            reservoir_pressure: 2000.0,
            power_draw: 150.0,
        }
    }
}

/// Cabin heater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Heater {
    /// Whether the heater is switched on.
    pub on: bool,
    /// Thermostat set point in degrees Celsius.
    pub target_temp: f64,
    /// Heat output in watts while on and powered.
    pub output_watts: f64,
    /// Electrical draw in watts while on.
    pub power_draw: f64,
}

impl Default for Heater {
    fn default() -> Self {
        Self {
            on: false,
            target_temp: 22.0,
            output_watts: 2000.0,
            power_draw: 0.0,
        }
    }
}

/// Ventilation fans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AirCirculation {
    /// Whether the fans are running.
    pub on: bool,
    /// Fan speed in percent.
    pub fan_speed: f64,
    /// Electrical draw in watts while on.
    pub power_draw: f64,
}

impl Default for AirCirculation {
    fn default() -> Self {
        Self {
            on: true,
            fan_speed: 50.0,
            power_draw: 100.0,
        }
    }
}

/// Humidity regulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HumidityControl {
    /// Control mode.
    pub mode: HumidityMode,
    /// Target relative humidity in percent.
    pub target_humidity: f64,
    /// Electrical draw in watts.
    pub power_draw: f64,
}

impl Default for HumidityControl {
    fn default() -> Self {
        Self {
            mode: HumidityMode::Auto,
            target_humidity: 50.0,
            power_draw: 50.0,
        }
    }
}

/// Life-support equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LifeSupportState {
    /// CO2 scrubber.
    pub co2_scrubber: Co2Scrubber,
    /// Oxygen generator.
    pub o2_generator: O2Generator,
    /// Heater.
    pub heater: Heater,
    /// Ventilation.
    pub air_circulation: AirCirculation,
    /// Humidity regulator.
    pub humidity_control: HumidityControl,
}

// ---------------------------------------------------------------------------
// Survivor
// ---------------------------------------------------------------------------

/// Vital signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vitals {
    /// Heart rate in beats per minute. Kept fractional so smoothing
    /// converges; rounded when reported.
    pub heart_rate: f64,
    /// Blood oxygen saturation in percent.
    pub oxygen_saturation: f64,
    /// Core temperature in degrees Celsius.
    pub body_temperature: f64,
    /// Blood pressure reading.
    pub blood_pressure: String,
    /// Breaths per minute.
    pub respiration_rate: u32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            heart_rate: 75.0,
            oxygen_saturation: 98.0,
            body_temperature: 37.0,
            blood_pressure: String::from("120/80"),
            respiration_rate: 16,
        }
    }
}

/// A carryable object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InventoryItem {
    /// Unique key of the item.
    pub item_id: String,
    /// Name shown to the player.
    pub name: String,
    /// How many are carried.
    pub quantity: u32,
    /// Remaining uses, for consumables.
    pub charges: Option<u32>,
}

impl InventoryItem {
    /// Create a single, non-consumable item.
    pub fn single(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            quantity: 1,
            charges: None,
        }
    }
}

/// Pressure suit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SuitState {
    /// Whether the suit is worn.
    pub wearing: bool,
    /// Suit oxygen supply in minutes.
    pub oxygen_supply: f64,
    /// Suit integrity in percent.
    pub integrity: f64,
}

impl Default for SuitState {
    fn default() -> Self {
        Self {
            wearing: false,
            oxygen_supply: 0.0,
            integrity: 100.0,
        }
    }
}

/// The survivor's body, mind and belongings.
///
/// `stress_level` and `fatigue` stay within `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SurvivorState {
    /// Module the survivor is in.
    pub location: String,
    /// Overall health in percent.
    pub health: f64,
    /// Consciousness state.
    pub status: HealthStatus,
    /// Vital signs.
    pub vitals: Vitals,
    /// Stress in percent.
    pub stress_level: f64,
    /// Fatigue in percent.
    pub fatigue: f64,
    /// Hydration in percent.
    pub hydration: f64,
    /// Remaining food energy in kcal.
    pub calories_remaining: f64,
    /// Carried items, in pickup order.
    pub inventory: Vec<InventoryItem>,
    /// Named conditions currently affecting the survivor.
    pub active_effects: Vec<String>,
    /// Pressure suit.
    pub suit: SuitState,
}

impl Default for SurvivorState {
    fn default() -> Self {
        Self {
            location: String::from("command_module"),
            health: 100.0,
            status: HealthStatus::Conscious,
            vitals: Vitals::default(),
            stress_level: 15.0,
            fatigue: 20.0,
            hydration: 85.0,
            calories_remaining: 2000.0,
            inventory: Vec::new(),
            active_effects: Vec::new(),
            suit: SuitState::default(),
        }
    }
}

impl SurvivorState {
    /// Add an item unless one with the same `item_id` is already carried.
    ///
    /// Returns `true` if the item was added.
    pub fn add_item(&mut self, item: InventoryItem) -> bool {
        if self.has_item(&item.item_id) {
            return false;
        }
        self.inventory.push(item);
        true
    }

    /// Whether an item with this id is carried.
    pub fn has_item(&self, item_id: &str) -> bool {
        self.inventory.iter().any(|i| i.item_id == item_id)
    }

    /// The set of carried item ids.
    pub fn item_ids(&self) -> BTreeSet<&str> {
        self.inventory.iter().map(|i| i.item_id.as_str()).collect()
    }

    /// Move the health status toward a worse state. Never improves it.
    pub fn worsen_status(&mut self, status: HealthStatus) {
        self.status = self.status.max(status);
    }

    /// Raise stress by `amount`, clamped to `[0, 100]`.
    pub fn add_stress(&mut self, amount: f64) {
        self.stress_level = (self.stress_level + amount).clamp(0.0, 100.0);
    }
}

// ---------------------------------------------------------------------------
// Communications and cargo
// ---------------------------------------------------------------------------

/// Antenna pointing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AntennaAngle {
    /// Azimuth in degrees.
    pub azimuth: f64,
    /// Elevation in degrees.
    pub elevation: f64,
}

impl Default for AntennaAngle {
    fn default() -> Self {
        Self {
            azimuth: 180.0,
            elevation: 45.0,
        }
    }
}

/// Radio transmitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Transmitter {
    /// Whether the transmitter is on.
    pub on: bool,
    /// Frequency in MHz.
    pub frequency_mhz: f64,
    /// Output power in watts.
    pub power_watts: f64,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self {
            on: true,
            frequency_mhz: 145.8,
            power_watts: 10.0,
        }
    }
}

/// Radio receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Receiver {
    /// Whether the receiver is on.
    pub on: bool,
    /// Squelch threshold.
    pub squelch: f64,
}

impl Default for Receiver {
    fn default() -> Self {
        Self {
            on: true,
            squelch: 0.3,
        }
    }
}

/// Link to Earth control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommunicationsState {
    /// Signal strength in percent.
    pub signal_strength: f64,
    /// Antenna pointing.
    pub antenna_angle: AntennaAngle,
    /// Transmitter.
    pub transmitter: Transmitter,
    /// Receiver.
    pub receiver: Receiver,
    /// Background noise level.
    pub noise_level: f64,
    /// When Earth was last heard from.
    pub last_contact: Option<DateTime<Utc>>,
}

impl Default for CommunicationsState {
    fn default() -> Self {
        Self {
            signal_strength: 85.0,
            antenna_angle: AntennaAngle::default(),
            transmitter: Transmitter::default(),
            receiver: Receiver::default(),
            noise_level: 0.2,
            last_contact: None,
        }
    }
}

/// Cargo bay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CargoBayState {
    /// Door state.
    pub door_status: DoorStatus,
    /// Whether bay and habitat pressure match.
    pub pressure_equalized: bool,
    /// Stored cargo.
    pub cargo_items: Vec<String>,
    /// Structural damage in percent.
    pub structural_damage: f64,
}

impl Default for CargoBayState {
    fn default() -> Self {
        Self {
            door_status: DoorStatus::Sealed,
            pressure_equalized: true,
            cargo_items: Vec::new(),
            structural_damage: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One entry in the event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Tick the event happened on.
    pub tick: u64,
    /// What happened.
    pub description: String,
}

/// Active, past and pending events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventLog {
    /// Events currently in effect.
    pub active: Vec<String>,
    /// Everything that has happened, oldest first.
    pub history: Vec<EventRecord>,
    /// Triggers waiting to fire.
    pub pending_triggers: Vec<String>,
}

impl EventLog {
    /// Append an event to the history.
    pub fn record(&mut self, tick: u64, description: impl Into<String>) {
        self.history.push(EventRecord {
            tick,
            description: description.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_nominal_habitat() {
        let state = HabitatState::default();
        assert!((state.environment.oxygen_level - 21.0).abs() < f64::EPSILON);
        assert!((state.environment.pressure - 101.325).abs() < f64::EPSILON);
        assert!(state.power.has_power());
        assert_eq!(state.life_support.co2_scrubber.status, EquipmentStatus::On);
        assert!(!state.life_support.heater.on);
        assert_eq!(state.survivor.location, "command_module");
        assert_eq!(state.metadata.scenario_id, "default");
        assert_eq!(state.metadata.tick_count, 0);
    }

    #[test]
    fn add_item_deduplicates_by_id() {
        let mut survivor = SurvivorState::default();
        assert!(survivor.add_item(InventoryItem::single("duct_tape", "Duct Tape")));
        assert!(!survivor.add_item(InventoryItem::single("duct_tape", "Another Tape")));
        assert_eq!(survivor.inventory.len(), 1);
        assert_eq!(
            survivor.inventory.first().map(|i| i.name.as_str()),
            Some("Duct Tape")
        );
    }

    #[test]
    fn inventory_keeps_pickup_order() {
        let mut survivor = SurvivorState::default();
        survivor.add_item(InventoryItem::single("b", "B"));
        survivor.add_item(InventoryItem::single("a", "A"));
        let names: Vec<&str> = survivor.inventory.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(survivor.item_ids().contains("a"));
    }

    #[test]
    fn status_never_improves() {
        let mut survivor = SurvivorState::default();
        survivor.worsen_status(HealthStatus::Unconscious);
        survivor.worsen_status(HealthStatus::Dizzy);
        assert_eq!(survivor.status, HealthStatus::Unconscious);
    }

    #[test]
    fn stress_is_clamped() {
        let mut survivor = SurvivorState::default();
        survivor.add_stress(500.0);
        assert!((survivor.stress_level - 100.0).abs() < f64::EPSILON);
        survivor.add_stress(-500.0);
        assert!(survivor.stress_level.abs() < f64::EPSILON);
    }

    #[test]
    fn battery_percent_handles_empty_bank() {
        let mut battery = BackupBattery::default();
        assert!((battery.charge_percent() - 100.0).abs() < f64::EPSILON);
        battery.charge_wh = 500.0;
        assert!((battery.charge_percent() - 25.0).abs() < f64::EPSILON);
        battery.capacity_wh = 0.0;
        assert!(battery.charge_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn oxygen_partial_pressure_at_sea_level() {
        let env = EnvironmentState::default();
        assert!((env.oxygen_partial_pressure() - 21.278_25).abs() < 1e-9);
    }

    #[test]
    fn unsealed_breaches_are_counted() {
        let mut env = EnvironmentState::default();
        env.breaches.push(Breach::new("airlock", 4.0));
        let mut sealed = Breach::new("galley", 1.0);
        sealed.sealed = true;
        env.breaches.push(sealed);
        assert_eq!(env.unsealed_breaches(), 1);
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = HabitatState::default();
        let json = serde_json::to_string(&state).unwrap_or_default();
        let restored: Result<HabitatState, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(state));
    }
}
