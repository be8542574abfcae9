//! Scripted scenarios and their puzzle logic.
//!
//! A scenario is a hand-authored [`PuzzleLogic`] variant keyed by a string
//! id. The [`ScenarioManager`] owns every registered variant, tracks which
//! one is active, and routes structured intents to it. Adding a scenario
//! means adding a type that implements [`PuzzleLogic`] and registering it.

pub mod co2_crisis;
pub mod power_box;

use std::collections::BTreeMap;

use habitat_types::{ActionType, HabitatState, Intent};
use tracing::{debug, info};

pub use co2_crisis::Co2CrisisPuzzle;
pub use power_box::PowerBoxPuzzle;

/// Errors raised by scenario management.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// No scenario is registered under the requested id.
    #[error("unknown scenario: {id}")]
    UnknownScenario {
        /// The id that was requested.
        id: String,
    },
}

/// Behavior of one scripted puzzle.
///
/// `start` puts the habitat into the puzzle's initial conditions and resets
/// the puzzle's own progress. `handle_interaction` reacts to one player
/// action and may mutate the state; it returns `None` when the action means
/// nothing to this puzzle.
pub trait PuzzleLogic: Send + std::fmt::Debug {
    /// Scenario id this puzzle is registered under.
    fn id(&self) -> &'static str;

    /// Apply the initial conditions. Calling it again re-applies them.
    fn start(&mut self, state: &mut HabitatState);

    /// React to a player action aimed at `target`.
    fn handle_interaction(
        &mut self,
        state: &mut HabitatState,
        action: ActionType,
        target: &str,
    ) -> Option<String>;

    /// Whether `start` has run.
    fn is_active(&self) -> bool;

    /// Whether the puzzle has been solved. Never reverts to `false`.
    fn is_solved(&self) -> bool;
}

/// Owns the puzzle variants and the active selection.
#[derive(Debug)]
pub struct ScenarioManager {
    puzzles: BTreeMap<&'static str, Box<dyn PuzzleLogic>>,
    active: Option<&'static str>,
}

impl Default for ScenarioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioManager {
    /// Create a manager with every built-in scenario registered.
    pub fn new() -> Self {
        let mut manager = Self::empty();
        manager.register(Box::new(Co2CrisisPuzzle::new()));
        manager.register(Box::new(PowerBoxPuzzle::new()));
        manager
    }

    /// Create a manager with no scenarios registered.
    pub const fn empty() -> Self {
        Self {
            puzzles: BTreeMap::new(),
            active: None,
        }
    }

    /// Register a puzzle, replacing any previous one with the same id.
    pub fn register(&mut self, puzzle: Box<dyn PuzzleLogic>) {
        self.puzzles.insert(puzzle.id(), puzzle);
    }

    /// Ids of every registered scenario, sorted.
    pub fn available(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.puzzles.keys().copied()
    }

    /// Activate a scenario and apply its initial conditions.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] if nothing is registered
    /// under `id`. The state is not touched in that case.
    pub fn load(&mut self, state: &mut HabitatState, id: &str) -> Result<(), ScenarioError> {
        let Some((&key, puzzle)) = self.puzzles.iter_mut().find(|(key, _)| **key == id) else {
            return Err(ScenarioError::UnknownScenario { id: id.to_owned() });
        };
        puzzle.start(state);
        state.metadata.scenario_id = key.to_owned();
        self.active = Some(key);
        info!(scenario = key, "Scenario loaded");
        Ok(())
    }

    /// Id of the active scenario, if any.
    pub const fn active_id(&self) -> Option<&'static str> {
        self.active
    }

    /// The active puzzle, if any.
    pub fn active_puzzle(&self) -> Option<&dyn PuzzleLogic> {
        self.active
            .and_then(|id| self.puzzles.get(id))
            .map(Box::as_ref)
    }

    /// Whether the active puzzle has been solved.
    pub fn is_solved(&self) -> bool {
        self.active_puzzle().is_some_and(PuzzleLogic::is_solved)
    }

    /// Route an intent to the active puzzle.
    ///
    /// Returns `None` when no scenario is active, the active puzzle is
    /// already solved, or the intent matched nothing.
    pub fn process(&mut self, state: &mut HabitatState, intent: &Intent) -> Option<String> {
        let id = self.active?;
        let puzzle = self.puzzles.get_mut(id)?;
        if puzzle.is_solved() {
            debug!(scenario = id, "Puzzle already solved, ignoring intent");
            return None;
        }

        let narrative = puzzle
            .handle_interaction(state, intent.action, &intent.target)
            .filter(|text| !text.is_empty());
        debug!(
            scenario = id,
            action = %intent.action,
            target = %intent.target,
            matched = narrative.is_some(),
            "Intent processed"
        );
        if puzzle.is_solved() {
            info!(scenario = id, tick = state.metadata.tick_count, "Puzzle solved");
        }
        narrative
    }
}

/// Lowercased alphanumeric words of a free-form target.
pub(crate) fn words(target: &str) -> Vec<String> {
    target
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
