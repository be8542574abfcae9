//! The CO2 crisis: improvise a seal for a mismatched scrubber filter.
//!
//! The scrubber is broken and CO2 is already at 2.5 %. The survivor has to
//! search the storage shelf (duct tape and hose) and the locker (a square
//! filter for a round slot), then combine everything on the scrubber.

use std::collections::BTreeSet;

use habitat_types::{ActionType, EquipmentStatus, HabitatState, InventoryItem};

use super::{PuzzleLogic, words};

/// Scenario id.
pub const ID: &str = "co2_crisis";

/// CO2 level at the start of the scenario, in percent.
pub const START_CO2_LEVEL: f64 = 2.5;

/// Scrub rate after the improvised repair, in percentage points per minute.
pub const REPAIRED_SCRUB_RATE: f64 = 0.8;

/// Item ids the repair needs, in the order they are reported missing.
pub const REQUIRED_ITEMS: [&str; 3] = ["duct_tape", "plastic_hose", "filter"];

const ROOM_DESCRIPTION: &str = "I'm in the Hab Module storage area. It's a mess. There's a \
    **warehouse shelf** overflowing with junk on the left, and my personal **locker** on the \
    right. The air scrubber is humming... no, wait, it's making a rattling noise.";

/// Searchable places and what they still hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Shelf,
    Locker,
}

impl Source {
    /// Matches anywhere in the lowercased target, so `warehouse_shelf`
    /// and `storage_locker` resolve like `shelf` and `locker`.
    fn from_target(target: &str) -> Option<Self> {
        if target.contains("shelf") || target.contains("warehouse") {
            Some(Self::Shelf)
        } else if target.contains("locker") {
            Some(Self::Locker)
        } else {
            None
        }
    }

    fn items(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Shelf => &[("duct_tape", "Duct Tape"), ("plastic_hose", "Plastic Hose")],
            Self::Locker => &[("filter", "CO2 Filter (Square)")],
        }
    }

    const fn found_text(self) -> &'static str {
        match self {
            Self::Shelf => "I found a roll of heavy-duty duct tape and some old plastic tubing.",
            Self::Locker => {
                "Found a spare CO2 filter. But wait... it's square. The slot is round. Damn it."
            }
        }
    }

    const fn empty_text(self) -> &'static str {
        match self {
            Self::Shelf => "The shelf is empty.",
            Self::Locker => "Just some dirty socks in here.",
        }
    }
}

/// Progress through the CO2 crisis.
#[derive(Debug, Clone, Default)]
pub struct Co2CrisisPuzzle {
    active: bool,
    solved: bool,
    searched: BTreeSet<Source>,
}

impl Co2CrisisPuzzle {
    /// Create an inactive puzzle.
    pub fn new() -> Self {
        Self::default()
    }

    fn search(&mut self, state: &mut HabitatState, target: &str) -> Option<String> {
        let words = words(target);
        if words.is_empty() || words.iter().any(|w| w == "room" || w == "around") {
            return Some(ROOM_DESCRIPTION.to_owned());
        }

        let source = Source::from_target(&target.to_lowercase())?;
        if !self.searched.insert(source) {
            return Some(source.empty_text().to_owned());
        }
        for (id, name) in source.items() {
            state.survivor.add_item(InventoryItem::single(*id, *name));
        }
        Some(source.found_text().to_owned())
    }

    fn repair(&mut self, state: &mut HabitatState, target: &str) -> Option<String> {
        let target = target.to_lowercase();
        if !target.contains("scrubber") && !target.contains("filter") {
            return None;
        }

        let carried = state.survivor.item_ids();
        let missing: Vec<&str> = REQUIRED_ITEMS
            .iter()
            .copied()
            .filter(|id| !carried.contains(id))
            .collect();
        if !missing.is_empty() {
            return Some(format!(
                "I can't fix it yet. I have the filter, but it doesn't fit. \
                 I need something to seal it. Missing: {}",
                missing.join(", ")
            ));
        }

        self.solved = true;
        let scrubber = &mut state.life_support.co2_scrubber;
        scrubber.status = EquipmentStatus::On;
        scrubber.scrub_rate = REPAIRED_SCRUB_RATE;
        Some(
            "Okay, I taped the square filter to the round hole using the hose as a seal. \
             It's ugly, but I hear the fans spinning up! CO2 levels dropping!"
                .to_owned(),
        )
    }
}

impl PuzzleLogic for Co2CrisisPuzzle {
    fn id(&self) -> &'static str {
        ID
    }

    fn start(&mut self, state: &mut HabitatState) {
        *self = Self {
            active: true,
            ..Self::default()
        };
        state.life_support.co2_scrubber.status = EquipmentStatus::Broken;
        state.environment.co2_level = START_CO2_LEVEL;
        state.survivor.location = String::from("hab_module");
        state.survivor.inventory.clear();
        state.metadata.scenario_id = ID.to_owned();
    }

    fn handle_interaction(
        &mut self,
        state: &mut HabitatState,
        action: ActionType,
        target: &str,
    ) -> Option<String> {
        if !self.active || self.solved {
            return None;
        }
        match action {
            ActionType::Examine => self.search(state, target),
            ActionType::UseItem => self.repair(state, target),
            _ => None,
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_solved(&self) -> bool {
        self.solved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn started() -> (Co2CrisisPuzzle, HabitatState) {
        let mut puzzle = Co2CrisisPuzzle::new();
        let mut state = HabitatState::default();
        state
            .survivor
            .add_item(InventoryItem::single("wrench", "Wrench"));
        puzzle.start(&mut state);
        (puzzle, state)
    }

    #[test]
    fn start_sets_up_the_crisis() {
        let (puzzle, state) = started();
        assert!(puzzle.is_active());
        assert!(!puzzle.is_solved());
        assert_eq!(
            state.life_support.co2_scrubber.status,
            EquipmentStatus::Broken
        );
        assert!((state.environment.co2_level - START_CO2_LEVEL).abs() < f64::EPSILON);
        assert_eq!(state.survivor.location, "hab_module");
        assert!(state.survivor.inventory.is_empty());
        assert_eq!(state.metadata.scenario_id, ID);
    }

    #[test]
    fn inactive_puzzle_ignores_everything() {
        let mut puzzle = Co2CrisisPuzzle::new();
        let mut state = HabitatState::default();
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Examine, "shelf")
                .is_none()
        );
    }

    #[test]
    fn looking_around_describes_the_room() {
        let (mut puzzle, mut state) = started();
        for target in ["", "the room", "around"] {
            let text = puzzle
                .handle_interaction(&mut state, ActionType::Examine, target)
                .unwrap();
            assert!(text.contains("**warehouse shelf**"));
        }
        assert!(state.survivor.inventory.is_empty());
    }

    #[test]
    fn shelf_search_is_idempotent() {
        let (mut puzzle, mut state) = started();
        let first = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "warehouse shelf")
            .unwrap();
        assert!(first.contains("duct tape"));
        let ids: Vec<&str> = state
            .survivor
            .inventory
            .iter()
            .map(|i| i.item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["duct_tape", "plastic_hose"]);

        let second = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "shelf")
            .unwrap();
        assert_eq!(second, "The shelf is empty.");
        assert_eq!(state.survivor.inventory.len(), 2);
    }

    #[test]
    fn compound_targets_name_the_same_sources() {
        let (mut puzzle, mut state) = started();
        let shelf = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "warehouse_shelf")
            .unwrap();
        assert!(shelf.contains("duct tape"));
        let locker = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "storage_locker")
            .unwrap();
        assert!(locker.contains("spare CO2 filter"));
        assert_eq!(state.survivor.inventory.len(), 3);

        let again = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "Bookshelf")
            .unwrap();
        assert_eq!(again, "The shelf is empty.");
        assert_eq!(state.survivor.inventory.len(), 3);
    }

    #[test]
    fn locker_grants_the_filter_once() {
        let (mut puzzle, mut state) = started();
        let first = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "Locker")
            .unwrap();
        assert!(first.contains("square"));
        assert_eq!(
            state.survivor.inventory.first().map(|i| i.name.as_str()),
            Some("CO2 Filter (Square)")
        );
        let second = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "locker")
            .unwrap();
        assert_eq!(second, "Just some dirty socks in here.");
        assert_eq!(state.survivor.inventory.len(), 1);
    }

    #[test]
    fn unknown_places_match_nothing() {
        let (mut puzzle, mut state) = started();
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Examine, "ceiling")
                .is_none()
        );
    }

    #[test]
    fn repair_without_items_lists_exactly_the_missing_ids() {
        let (mut puzzle, mut state) = started();
        let text = puzzle
            .handle_interaction(&mut state, ActionType::UseItem, "scrubber")
            .unwrap();
        assert!(text.ends_with("Missing: duct_tape, plastic_hose, filter"));

        let _ = puzzle.handle_interaction(&mut state, ActionType::Examine, "locker");
        let before = state.clone();
        let text = puzzle
            .handle_interaction(&mut state, ActionType::UseItem, "filter")
            .unwrap();
        assert!(text.ends_with("Missing: duct_tape, plastic_hose"));
        assert_eq!(state, before);
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn repair_on_other_targets_matches_nothing() {
        let (mut puzzle, mut state) = started();
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::UseItem, "door")
                .is_none()
        );
    }

    #[test]
    fn full_repair_restores_the_scrubber() {
        let (mut puzzle, mut state) = started();
        let _ = puzzle.handle_interaction(&mut state, ActionType::Examine, "shelf");
        let _ = puzzle.handle_interaction(&mut state, ActionType::Examine, "locker");
        let text = puzzle
            .handle_interaction(&mut state, ActionType::UseItem, "CO2 scrubber")
            .unwrap();
        assert!(text.contains("CO2 levels dropping"));
        assert!(puzzle.is_solved());
        assert_eq!(state.life_support.co2_scrubber.status, EquipmentStatus::On);
        assert!((state.life_support.co2_scrubber.scrub_rate - REPAIRED_SCRUB_RATE).abs() < 1e-12);

        // Solved is terminal.
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Examine, "around")
                .is_none()
        );
    }
}
