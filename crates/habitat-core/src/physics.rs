//! Environmental, electrical and physiological simulation.
//!
//! [`PhysicsSimulator::step`] advances the habitat by one explicit Euler
//! step. Each phase reads the state left by the previous one:
//!
//! 1. Gas balance (O2 consumption and replenishment, CO2 production and
//!    scrubbing)
//! 2. Thermal balance (metabolic, equipment and heater input; linear loss
//!    toward the Martian exterior)
//! 3. Pressure coupling (isochoric `P ∝ T`, then breach leaks)
//! 4. Power balance (load versus solar, battery drain, blackout)
//! 5. Physiology (heart-rate smoothing, stress accumulation)
//! 6. Bookkeeping (tick count, elapsed time)
//!
//! The model is deterministic and uses no randomness. Malformed input
//! (negative or non-finite `dt`, non-finite state) is a programming error
//! and panics.

use habitat_types::HabitatState;
use tracing::warn;

use crate::sensory;

/// Baseline survivor oxygen consumption, in percentage points per second.
pub const O2_CONSUMPTION_PER_SEC: f64 = 0.0008;

/// Respiratory quotient: CO2 produced per unit of O2 consumed.
pub const RESPIRATORY_QUOTIENT: f64 = 0.8;

/// Survivor metabolic heat in watts.
pub const METABOLIC_HEAT_W: f64 = 100.0;

/// Fraction of electrical load dissipated as heat.
pub const EQUIPMENT_HEAT_FRACTION: f64 = 0.1;

/// Exterior temperature the habitat loses heat toward, in degrees Celsius.
pub const EXTERIOR_TEMP_C: f64 = -60.0;

/// Lumped hull conductance in watts per kelvin.
pub const HEAT_LOSS_W_PER_K: f64 = 50.0;

/// Mass of the habitat air in kilograms.
pub const AIR_MASS_KG: f64 = 600.0;

/// Specific heat of air in J/(kg·K).
pub const AIR_SPECIFIC_HEAT: f64 = 1005.0;

/// Pressure lost per unsealed breach, in kPa per second.
pub const BREACH_LEAK_KPA_PER_SEC: f64 = 0.1;

/// Always-on electrical base load in watts.
pub const BASE_LOAD_W: f64 = 100.0;

/// Resting heart rate in beats per minute.
pub const RESTING_HEART_RATE: f64 = 75.0;

const KELVIN_OFFSET: f64 = 273.15;

/// Advances a [`HabitatState`] through time.
///
/// The simulator keeps no copy of the state. Its only memory is the
/// temperature seen at the end of the last pressure update, which drives
/// the isochoric pressure correction.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsSimulator {
    previous_temperature: f64,
}

impl PhysicsSimulator {
    /// Create a simulator primed with the state's current temperature.
    pub const fn new(state: &HabitatState) -> Self {
        Self {
            previous_temperature: state.environment.temperature,
        }
    }

    /// The temperature recorded by the last pressure update.
    pub const fn previous_temperature(&self) -> f64 {
        self.previous_temperature
    }

    /// Advance the state by `dt` seconds and describe the result.
    ///
    /// `dt == 0` changes nothing physical but still counts as a tick.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative or not finite, or if any simulated
    /// quantity in `state` is not finite.
    pub fn step(&mut self, state: &mut HabitatState, dt: f64) -> String {
        assert!(dt.is_finite() && dt >= 0.0, "invalid time step: {dt}");
        assert_finite_state(state);

        self.update_environment(state, dt);
        update_power(state, dt);
        update_physiology(state, dt);

        state.metadata.tick_count = state.metadata.tick_count.saturating_add(1);
        state.metadata.elapsed_seconds += dt;

        sensory::translate(state)
    }

    fn update_environment(&mut self, state: &mut HabitatState, dt: f64) {
        let powered = state.power.has_power();
        let ls = &state.life_support;

        // Gas balance
        let o2_consumption = O2_CONSUMPTION_PER_SEC;
        let co2_production = o2_consumption * RESPIRATORY_QUOTIENT;
        let co2_scrubbing = if ls.co2_scrubber.status.is_on() && powered {
            ls.co2_scrubber.scrub_rate / 60.0
        } else {
            0.0
        };
        let o2_replenishment = if ls.o2_generator.status.is_on() && powered {
            ls.o2_generator.output_rate / 60.0
        } else {
            0.0
        };

        let heater_heat = if ls.heater.on && powered {
            ls.heater.output_watts
        } else {
            0.0
        };

        let env = &mut state.environment;
        env.oxygen_level =
            (env.oxygen_level + (o2_replenishment - o2_consumption) * dt).clamp(0.0, 100.0);
        env.co2_level = (env.co2_level + (co2_production - co2_scrubbing) * dt).clamp(0.0, 100.0);

        // Thermal balance. Equipment heat uses the load from the previous step.
        let heat_in =
            METABOLIC_HEAT_W + EQUIPMENT_HEAT_FRACTION * state.power.total_load + heater_heat;
        env.temperature += thermal_delta(env.temperature, heat_in, dt);

        // Pressure coupling: ratio against the previous temperature, then record.
        #[allow(clippy::float_cmp)]
        let temperature_changed = env.temperature != self.previous_temperature;
        if temperature_changed {
            let ratio =
                (env.temperature + KELVIN_OFFSET) / (self.previous_temperature + KELVIN_OFFSET);
            env.pressure *= ratio;
            self.previous_temperature = env.temperature;
        }

        for _ in 0..env.unsealed_breaches() {
            env.pressure = (env.pressure - BREACH_LEAK_KPA_PER_SEC * dt).max(0.0);
        }
    }
}

/// Temperature change over `dt` for `heat_in_w` watts of input against
/// linear hull loss toward [`EXTERIOR_TEMP_C`].
pub const fn thermal_delta(temperature: f64, heat_in_w: f64, dt: f64) -> f64 {
    let heat_loss = (temperature - EXTERIOR_TEMP_C) * HEAT_LOSS_W_PER_K;
    (heat_in_w - heat_loss) * dt / (AIR_MASS_KG * AIR_SPECIFIC_HEAT)
}

/// Total electrical load in watts for the current equipment configuration.
pub fn total_load(state: &HabitatState) -> f64 {
    let ls = &state.life_support;
    let mut load = BASE_LOAD_W;
    if ls.co2_scrubber.status.is_on() {
        load += ls.co2_scrubber.power_draw;
    }
    if ls.o2_generator.status.is_on() {
        load += ls.o2_generator.power_draw;
    }
    if ls.heater.on {
        load += ls.heater.power_draw;
    }
    if ls.air_circulation.on {
        load += ls.air_circulation.power_draw;
    }
    load
}

/// Current solar supply in watts.
pub const fn solar_supply(state: &HabitatState) -> f64 {
    let panels = &state.power.solar_panels;
    if panels.online { panels.output_watts } else { 0.0 }
}

fn update_power(state: &mut HabitatState, dt: f64) {
    let load = total_load(state);
    let solar = solar_supply(state);
    let power = &mut state.power;
    power.total_load = load;

    // A surplus leaves both the battery and the bus flag alone.
    if solar >= load {
        return;
    }

    let deficit = load - solar;
    let battery = &mut power.battery;
    battery.charge_wh -= deficit * dt / 3600.0;
    if battery.charge_wh <= 0.0 {
        battery.charge_wh = 0.0;
        if power.main_bus.online {
            warn!(
                tick = state.metadata.tick_count,
                load_w = load,
                solar_w = solar,
                "Battery depleted, main bus offline"
            );
        }
        power.main_bus.online = false;
    }
}

fn update_physiology(state: &mut HabitatState, dt: f64) {
    let env = &state.environment;
    let survivor = &mut state.survivor;

    let mut target = RESTING_HEART_RATE;
    if survivor.stress_level > 50.0 {
        target += 20.0;
    }
    if env.co2_level > 1.0 {
        target += 30.0;
    }
    if env.oxygen_level < 18.0 {
        target += 20.0;
    }
    survivor.vitals.heart_rate = lerp(survivor.vitals.heart_rate, target, 0.1 * dt);

    let mut stress_rate = 0.0;
    if env.co2_level > 1.0 {
        stress_rate += 1.0;
    }
    if !(5.0..=35.0).contains(&env.temperature) {
        stress_rate += 0.5;
    }
    survivor.stress_level = (survivor.stress_level + stress_rate * dt).clamp(0.0, 100.0);
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(t, start)
}

fn assert_finite_state(state: &HabitatState) {
    let env = &state.environment;
    let fields = [
        ("oxygen_level", env.oxygen_level),
        ("co2_level", env.co2_level),
        ("temperature", env.temperature),
        ("pressure", env.pressure),
        ("battery_charge_wh", state.power.battery.charge_wh),
        ("heart_rate", state.survivor.vitals.heart_rate),
        ("stress_level", state.survivor.stress_level),
    ];
    for (name, value) in fields {
        assert!(value.is_finite(), "non-finite state field {name}: {value}");
    }
}
