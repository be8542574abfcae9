//! The engine: sole owner of the live habitat state.
//!
//! [`Engine`] composes the state, the physics simulator and the scenario
//! manager. The tick loop and command handlers share one engine behind a
//! single [`SharedEngine`] lock so ticks and puzzle interactions never
//! interleave. Collaborators only ever receive clones and projections.

use std::sync::Arc;

use chrono::Utc;
use habitat_types::{HabitatState, HealthStatus, Intent, Telemetry};
use serde::Serialize;
use tracing::{debug, info};

use crate::physics::PhysicsSimulator;
use crate::scenario::{ScenarioError, ScenarioManager};
use crate::sensory;

/// An engine shared between the tick loop and command handlers.
pub type SharedEngine = Arc<tokio::sync::Mutex<Engine>>;

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Tick number that just ran (1-based).
    pub tick: u64,
    /// Rounded readings after the tick.
    pub telemetry: Telemetry,
    /// Sensory description after the tick.
    pub sensory: String,
    /// Whether the survivor is dead.
    pub game_over: bool,
}

/// Composition root for the simulation.
#[derive(Debug)]
pub struct Engine {
    state: HabitatState,
    physics: PhysicsSimulator,
    scenarios: ScenarioManager,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the default habitat and built-in scenarios.
    pub fn new() -> Self {
        Self::from_state(HabitatState::default())
    }

    /// Create an engine around an existing state.
    pub fn from_state(state: HabitatState) -> Self {
        Self::with_scenarios(state, ScenarioManager::new())
    }

    /// Create an engine with a custom scenario set.
    pub fn with_scenarios(state: HabitatState, scenarios: ScenarioManager) -> Self {
        let physics = PhysicsSimulator::new(&state);
        Self {
            state,
            physics,
            scenarios,
        }
    }

    /// Wrap the engine for sharing between tasks.
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Load a scenario and apply its initial conditions.
    ///
    /// The physics temperature reference is re-primed afterwards, since
    /// scenarios may set the cabin temperature directly.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] for an unregistered id.
    pub fn load_scenario(&mut self, id: &str) -> Result<(), ScenarioError> {
        self.scenarios.load(&mut self.state, id)?;
        self.physics = PhysicsSimulator::new(&self.state);
        let tick = self.state.metadata.tick_count;
        self.state
            .events
            .record(tick, format!("Scenario {id} loaded"));
        Ok(())
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative or not finite.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let was_powered = self.state.power.has_power();
        let sensory = self.physics.step(&mut self.state, dt);
        self.state.metadata.last_update = Some(Utc::now());

        let tick = self.state.metadata.tick_count;
        if was_powered && !self.state.power.has_power() {
            self.state
                .events
                .record(tick, "Blackout: battery depleted, main bus offline");
        }

        let report = TickReport {
            tick,
            telemetry: Telemetry::from_state(&self.state),
            sensory,
            game_over: self.is_game_over(),
        };
        debug!(
            tick,
            co2 = report.telemetry.co2,
            o2 = report.telemetry.o2,
            temp = report.telemetry.temp,
            heart_rate = report.telemetry.heart_rate,
            "Tick complete"
        );
        report
    }

    /// Route a structured intent to the active scenario.
    ///
    /// Returns the scripted narrative, or `None` if nothing happened.
    pub fn apply_intent(&mut self, intent: &Intent) -> Option<String> {
        let solved_before = self.scenarios.is_solved();
        let narrative = self.scenarios.process(&mut self.state, intent);
        if !solved_before && self.scenarios.is_solved() {
            let tick = self.state.metadata.tick_count;
            let id = self.scenarios.active_id().unwrap_or("unknown");
            self.state.events.record(tick, format!("Scenario {id} solved"));
            info!(tick, scenario = id, "Scenario solved");
        }
        narrative
    }

    /// Rounded telemetry for the current state.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry::from_state(&self.state)
    }

    /// Sensory description of the current state.
    pub fn sensory(&self) -> String {
        sensory::translate(&self.state)
    }

    /// A full copy of the current state.
    pub fn snapshot(&self) -> HabitatState {
        self.state.clone()
    }

    /// Read-only access to the live state.
    pub const fn state(&self) -> &HabitatState {
        &self.state
    }

    /// Id of the active scenario, if any.
    pub const fn active_scenario(&self) -> Option<&'static str> {
        self.scenarios.active_id()
    }

    /// Whether the active scenario has been solved.
    pub fn scenario_solved(&self) -> bool {
        self.scenarios.is_solved()
    }

    /// Whether the survivor is dead.
    pub fn is_game_over(&self) -> bool {
        self.state.survivor.status == HealthStatus::Dead
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use habitat_types::{ActionType, EquipmentStatus};

    use super::*;

    #[test]
    fn tick_reports_telemetry_and_sensory() {
        let mut engine = Engine::new();
        let report = engine.tick(1.0);
        assert_eq!(report.tick, 1);
        assert!(!report.game_over);
        assert!(report.sensory.contains("[HUD DATA]"));
        assert_eq!(report.telemetry, engine.telemetry());
        assert!(engine.state().metadata.last_update.is_some());
    }

    #[test]
    fn unknown_scenario_leaves_engine_untouched() {
        let mut engine = Engine::new();
        assert!(engine.load_scenario("nope").is_err());
        assert!(engine.active_scenario().is_none());
        assert!(engine.state().events.history.is_empty());
    }

    #[test]
    fn co2_crisis_end_to_end() {
        let mut engine = Engine::new();
        engine.load_scenario("co2_crisis").unwrap();
        assert!((engine.telemetry().co2 - 2.5).abs() < 1e-12);

        let early = engine
            .apply_intent(&Intent::new(ActionType::UseItem, "scrubber"))
            .unwrap();
        assert!(early.ends_with("Missing: duct_tape, plastic_hose, filter"));
        assert_eq!(
            engine.state().life_support.co2_scrubber.status,
            EquipmentStatus::Broken
        );

        let _ = engine.apply_intent(&Intent::new(ActionType::Examine, "shelf"));
        let _ = engine.apply_intent(&Intent::new(ActionType::Examine, "locker"));
        assert_eq!(engine.telemetry().inventory.len(), 3);

        let done = engine
            .apply_intent(&Intent::new(ActionType::UseItem, "scrubber"))
            .unwrap();
        assert!(done.contains("fans spinning up"));
        assert!(engine.scenario_solved());
        assert_eq!(
            engine.state().life_support.co2_scrubber.status,
            EquipmentStatus::On
        );

        // With the boosted scrubber running, CO2 falls.
        let before = engine.state().environment.co2_level;
        let _ = engine.tick(1.0);
        assert!(engine.state().environment.co2_level < before);

        let history: Vec<&str> = engine
            .state()
            .events
            .history
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(
            history,
            vec!["Scenario co2_crisis loaded", "Scenario co2_crisis solved"]
        );
    }

    #[test]
    fn blackout_is_recorded_once() {
        let mut state = HabitatState::default();
        state.power.solar_panels.online = false;
        state.power.battery.charge_wh = 0.1;
        let mut engine = Engine::from_state(state);
        for _ in 0..5 {
            let _ = engine.tick(1.0);
        }
        let blackouts = engine
            .state()
            .events
            .history
            .iter()
            .filter(|e| e.description.starts_with("Blackout"))
            .count();
        assert_eq!(blackouts, 1);
        assert!(engine.sensory().contains("Total blackout"));
    }

    #[test]
    fn scenario_load_reprimes_pressure_reference() {
        let mut engine = Engine::new();
        engine.load_scenario("power_box").unwrap();
        let before = engine.state().environment.pressure;
        let _ = engine.tick(1.0);
        let after = engine.state().environment.pressure;
        // Only the tiny per-tick cooling should move pressure.
        assert!((after - before).abs() < 0.01);
    }

    #[test]
    fn power_box_restores_power() {
        let mut engine = Engine::new();
        engine.load_scenario("power_box").unwrap();
        assert!(engine.sensory().contains("Total blackout"));
        for target in ["open cover", "red to terminal a", "blue to terminal b", "switch"] {
            let _ = engine.apply_intent(&Intent::new(ActionType::Interact, target));
        }
        assert!(engine.scenario_solved());
        assert!(engine.state().power.has_power());
    }

    #[test]
    fn dead_survivor_ends_the_game() {
        let mut state = HabitatState::default();
        state.survivor.status = HealthStatus::Dead;
        let mut engine = Engine::from_state(state);
        assert!(engine.tick(1.0).game_over);
    }

    #[test]
    fn snapshot_is_detached() {
        let engine = Engine::new();
        let mut snap = engine.snapshot();
        snap.environment.oxygen_level = 0.0;
        assert!((engine.state().environment.oxygen_level - 21.0).abs() < f64::EPSILON);
    }
}
