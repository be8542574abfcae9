//! Numeric state rendered as first-person sensory text.
//!
//! [`translate`] is pure and total. It concatenates three independently
//! triggered sections (environment, physiology, systems) and always appends
//! a fixed-format HUD footer. Sections with nothing to say are omitted.

use habitat_types::HabitatState;
use habitat_types::telemetry::whole_bpm;

/// Describe what the survivor currently perceives.
pub fn translate(state: &HabitatState) -> String {
    let mut sections: Vec<String> = [environment(state), physiology(state), systems(state)]
        .into_iter()
        .filter(|lines| !lines.is_empty())
        .map(|lines| lines.join(" "))
        .collect();
    sections.push(hud_footer(state));
    sections.join("\n")
}

/// The fixed-format telemetry line appended to every description.
pub fn hud_footer(state: &HabitatState) -> String {
    let env = &state.environment;
    format!(
        "[HUD DATA] TEMP: {:.1}C | PRESS: {:.1}kPa | O2: {:.1}% | CO2: {:.2}% | HR: {}bpm",
        env.temperature,
        env.pressure,
        env.oxygen_level,
        env.co2_level,
        whole_bpm(state.survivor.vitals.heart_rate),
    )
}

fn environment(state: &HabitatState) -> Vec<&'static str> {
    let env = &state.environment;
    let mut lines = Vec::new();

    if env.temperature > 50.0 {
        lines.push("The air is scorching hot, burning your skin.");
    } else if env.temperature > 35.0 {
        lines.push("It's sweltering in here, sweat is pouring down your face.");
    } else if env.temperature < -20.0 {
        lines.push("It's freezing cold, your breath turns to ice instantly.");
    } else if env.temperature < 5.0 {
        lines.push("You can see your breath, it's getting very cold.");
    }

    if env.oxygen_partial_pressure() < 12.0 {
        lines.push("You feel dizzy and lightheaded (Hypoxia).");
    }
    if env.pressure < 70.0 {
        lines.push("Your ears are popping painfully.");
    }

    if env.co2_level > 3.0 {
        lines.push("You have a splitting headache and feel nauseous (CO2 Poisoning).");
    } else if env.co2_level > 1.0 {
        lines.push("The air feels stale and heavy.");
    }

    lines
}

fn physiology(state: &HabitatState) -> Vec<&'static str> {
    let survivor = &state.survivor;
    let mut lines = Vec::new();
    if survivor.stress_level > 80.0 {
        lines.push("Your heart is pounding out of your chest.");
    }
    if survivor.fatigue > 80.0 {
        lines.push("You are exhausted, barely able to keep your eyes open.");
    }
    lines
}

fn systems(state: &HabitatState) -> Vec<&'static str> {
    let mut lines = Vec::new();
    if !state.power.has_power() {
        lines.push("Total blackout. Only emergency lights are blinking.");
    } else if state.power.battery.charge_percent() < 20.0 {
        lines.push("Low battery alarm is beeping.");
    }
    if !state.life_support.air_circulation.on {
        lines.push("The ventilation fans have stopped. It's deadly quiet.");
    }
    lines
}
