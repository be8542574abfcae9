//! The power box: rewire the main PDU after a total blackout.
//!
//! The habitat is dark and cold. The survivor opens the distribution box,
//! connects the red wire to terminal A and the blue wire to terminal B (in
//! either order) and flips the main switch. That brings the solar array
//! and the main bus back. Crossing the wires, or flipping the switch with
//! only one wire in, shorts the panel for good.

use habitat_types::{ActionType, HabitatState, HealthStatus};

use super::{PuzzleLogic, words};

/// Scenario id.
pub const ID: &str = "power_box";

/// Cabin temperature at the start of the scenario, in degrees Celsius.
pub const START_TEMPERATURE: f64 = 4.0;

/// Stress added by the shock of a short circuit.
pub const SHORT_CIRCUIT_STRESS: f64 = 30.0;

/// Where the box is in its repair sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelState {
    /// Cover on.
    #[default]
    Closed,
    /// Cover off, nothing connected.
    Open,
    /// Red wire in terminal A.
    RedConnected,
    /// Blue wire in terminal B.
    BlueConnected,
    /// Both wires in, switch off.
    Wired,
    /// Switch flipped with correct wiring.
    Restored,
    /// Shorted out. Nothing more can be done.
    Shorted,
}

impl PanelState {
    /// What the survivor sees in this state.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Closed => {
                "You are standing in front of a gray metal box labeled 'MAIN PDU'. It's covered \
                 in dust. A red light is blinking slowly. It's freezing in here."
            }
            Self::Open => {
                "The cover is off. Inside is a mess of wires. There's a loose RED wire, a loose \
                 BLUE wire, and a switch labeled 'MAIN'. There are two terminals: 'A' (Positive) \
                 and 'B' (Negative)."
            }
            Self::RedConnected => {
                "The RED wire is jammed into Terminal A. The BLUE wire is still dangling. The \
                 switch is OFF."
            }
            Self::BlueConnected => {
                "The BLUE wire is connected to Terminal B. The RED wire is still loose. The \
                 switch is OFF."
            }
            Self::Wired => "Both wires are in. The switch labeled 'MAIN' is still OFF.",
            Self::Restored => "HUMMMMM. The machine is alive! Lights are flickering on. You did it!",
            Self::Shorted => {
                "SPARKS! FIRE! OUCH! The panel is smoking. I think I blew a fuse... or my \
                 eyebrows."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    A,
    B,
}

/// What an interaction asks the box to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    OpenCover,
    Connect(Wire, Terminal),
    FlipSwitch,
}

impl Operation {
    fn parse(target: &str) -> Option<Self> {
        let words = words(target);
        let has = |w: &str| words.iter().any(|x| x == w);

        let wire = if has("red") {
            Some(Wire::Red)
        } else if has("blue") {
            Some(Wire::Blue)
        } else {
            None
        };
        if let Some(wire) = wire
            && let Some(term) = terminal(&words)
        {
            return Some(Self::Connect(wire, term));
        }
        if has("switch") || has("main") {
            return Some(Self::FlipSwitch);
        }
        if has("open") || has("cover") || has("lid") || has("box") || has("pdu") {
            return Some(Self::OpenCover);
        }
        None
    }
}

/// The terminal letter named in `words`.
///
/// A letter right after `terminal`, `to` or `into` wins; otherwise the last
/// standalone `a` or `b` is used, so an article early in the phrase does not
/// count.
fn terminal(words: &[String]) -> Option<Terminal> {
    let letter = |w: &str| match w {
        "a" => Some(Terminal::A),
        "b" => Some(Terminal::B),
        _ => None,
    };
    let after_marker = words.windows(2).find_map(|pair| match pair {
        [marker, next] if matches!(marker.as_str(), "terminal" | "to" | "into") => {
            letter(next.as_str())
        }
        _ => None,
    });
    after_marker.or_else(|| words.iter().rev().find_map(|w| letter(w.as_str())))
}

/// Progress through the power box repair.
#[derive(Debug, Clone, Default)]
pub struct PowerBoxPuzzle {
    active: bool,
    panel: PanelState,
}

impl PowerBoxPuzzle {
    /// Create an inactive puzzle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current panel state.
    pub const fn panel(&self) -> PanelState {
        self.panel
    }

    fn operate(&mut self, state: &mut HabitatState, op: Operation) -> String {
        use PanelState as P;

        let (next, text) = match (self.panel, op) {
            (P::Closed, Operation::OpenCover) => (P::Open, "I pried the cover off. It's ugly inside."),
            (P::Closed, _) => (P::Closed, "I can't do that yet. The box is closed."),

            (P::Open, Operation::Connect(Wire::Red, Terminal::A)) => {
                (P::RedConnected, "Okay, Red to A. Fits snug.")
            }
            (P::Open, Operation::Connect(Wire::Blue, Terminal::B)) => {
                (P::BlueConnected, "Blue into B. Got it.")
            }
            (P::BlueConnected, Operation::Connect(Wire::Red, Terminal::A)) => {
                (P::Wired, "Red into A. Both wires in.")
            }
            (P::RedConnected, Operation::Connect(Wire::Blue, Terminal::B)) => {
                (P::Wired, "Blue in B. All wires set.")
            }
            (
                P::RedConnected | P::Wired,
                Operation::Connect(Wire::Red, Terminal::A),
            )
            | (P::BlueConnected | P::Wired, Operation::Connect(Wire::Blue, Terminal::B)) => {
                (self.panel, "That one's already in.")
            }
            (
                P::Open | P::RedConnected | P::BlueConnected | P::Wired,
                Operation::Connect(Wire::Red, Terminal::B)
                | Operation::Connect(Wire::Blue, Terminal::A),
            ) => (P::Shorted, "Wait... ZAP! No! Wrong wire!"),

            (P::Open, Operation::FlipSwitch) => (P::Open, "Nothing happened. Wires aren't connected."),
            (P::RedConnected | P::BlueConnected, Operation::FlipSwitch) => {
                (P::Shorted, P::Shorted.description())
            }
            (P::Wired, Operation::FlipSwitch) => (P::Restored, P::Restored.description()),

            (P::Open | P::RedConnected | P::BlueConnected | P::Wired, Operation::OpenCover) => {
                (self.panel, "The cover is already off.")
            }
            (P::Restored | P::Shorted, _) => (self.panel, self.panel.description()),
        };

        if next != self.panel {
            self.enter(state, next);
        }
        text.to_owned()
    }

    fn enter(&mut self, state: &mut HabitatState, next: PanelState) {
        self.panel = next;
        match next {
            PanelState::Restored => {
                state.power.solar_panels.online = true;
                state.power.main_bus.online = true;
            }
            PanelState::Shorted => {
                state.survivor.worsen_status(HealthStatus::Dizzy);
                state.survivor.add_stress(SHORT_CIRCUIT_STRESS);
            }
            _ => {}
        }
    }
}

impl PuzzleLogic for PowerBoxPuzzle {
    fn id(&self) -> &'static str {
        ID
    }

    fn start(&mut self, state: &mut HabitatState) {
        *self = Self {
            active: true,
            panel: PanelState::Closed,
        };
        let power = &mut state.power;
        power.main_bus.online = false;
        power.solar_panels.online = false;
        power.battery.charge_wh = 0.0;
        state.life_support.heater.on = false;
        state.environment.temperature = START_TEMPERATURE;
        state.survivor.location = String::from("power_room");
        state.metadata.scenario_id = ID.to_owned();
    }

    fn handle_interaction(
        &mut self,
        state: &mut HabitatState,
        action: ActionType,
        target: &str,
    ) -> Option<String> {
        if !self.active || self.is_solved() {
            return None;
        }
        match action {
            ActionType::Examine => {
                let words = words(target);
                let about_box = words.is_empty()
                    || words
                        .iter()
                        .any(|w| matches!(w.as_str(), "box" | "pdu" | "panel" | "around" | "room"));
                about_box.then(|| self.panel.description().to_owned())
            }
            ActionType::Interact | ActionType::UseItem => {
                let op = Operation::parse(target)?;
                Some(self.operate(state, op))
            }
            _ => None,
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_solved(&self) -> bool {
        self.panel == PanelState::Restored
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn started() -> (PowerBoxPuzzle, HabitatState) {
        let mut puzzle = PowerBoxPuzzle::new();
        let mut state = HabitatState::default();
        puzzle.start(&mut state);
        (puzzle, state)
    }

    fn interact(puzzle: &mut PowerBoxPuzzle, state: &mut HabitatState, target: &str) -> String {
        puzzle
            .handle_interaction(state, ActionType::Interact, target)
            .unwrap()
    }

    #[test]
    fn start_blacks_out_the_habitat() {
        let (puzzle, state) = started();
        assert!(puzzle.is_active());
        assert_eq!(puzzle.panel(), PanelState::Closed);
        assert!(!state.power.main_bus.online);
        assert!(!state.power.solar_panels.online);
        assert_eq!(state.metadata.scenario_id, ID);
    }

    #[test]
    fn terminal_ignores_leading_article() {
        let w = words("put a red wire into b");
        assert_eq!(terminal(&w), Some(Terminal::B));
        let w = words("red wire, terminal A");
        assert_eq!(terminal(&w), Some(Terminal::A));
        assert_eq!(terminal(&words("red wire")), None);
    }

    #[test]
    fn closed_box_rejects_wiring() {
        let (mut puzzle, mut state) = started();
        let text = interact(&mut puzzle, &mut state, "red wire to A");
        assert_eq!(text, "I can't do that yet. The box is closed.");
        assert_eq!(puzzle.panel(), PanelState::Closed);
    }

    #[test]
    fn correct_sequence_restores_power() {
        for order in [["red to terminal a", "blue to terminal b"], ["blue into b", "red into a"]] {
            let (mut puzzle, mut state) = started();
            let _ = interact(&mut puzzle, &mut state, "open the cover");
            assert_eq!(puzzle.panel(), PanelState::Open);
            for step in order {
                let _ = interact(&mut puzzle, &mut state, step);
            }
            assert_eq!(puzzle.panel(), PanelState::Wired);
            assert!(!state.power.main_bus.online);

            let text = interact(&mut puzzle, &mut state, "main switch");
            assert!(text.contains("alive"));
            assert!(puzzle.is_solved());
            assert!(state.power.main_bus.online);
            assert!(state.power.solar_panels.online);
        }
    }

    #[test]
    fn crossed_wires_short_the_panel() {
        let (mut puzzle, mut state) = started();
        let _ = interact(&mut puzzle, &mut state, "cover");
        let text = interact(&mut puzzle, &mut state, "red wire to terminal b");
        assert_eq!(text, "Wait... ZAP! No! Wrong wire!");
        assert_eq!(puzzle.panel(), PanelState::Shorted);
        assert_eq!(state.survivor.status, HealthStatus::Dizzy);
        assert!((state.survivor.stress_level - 45.0).abs() < 1e-12);

        // Terminal: further attempts only describe the damage.
        let text = interact(&mut puzzle, &mut state, "switch");
        assert!(text.starts_with("SPARKS!"));
        assert!(!state.power.main_bus.online);
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn switch_with_partial_wiring_shorts() {
        let (mut puzzle, mut state) = started();
        let _ = interact(&mut puzzle, &mut state, "open box");
        let _ = interact(&mut puzzle, &mut state, "red to a");
        let _ = interact(&mut puzzle, &mut state, "flip switch");
        assert_eq!(puzzle.panel(), PanelState::Shorted);
    }

    #[test]
    fn switch_on_empty_box_does_nothing() {
        let (mut puzzle, mut state) = started();
        let _ = interact(&mut puzzle, &mut state, "open lid");
        let text = interact(&mut puzzle, &mut state, "switch");
        assert_eq!(text, "Nothing happened. Wires aren't connected.");
        assert_eq!(puzzle.panel(), PanelState::Open);
    }

    #[test]
    fn examine_describes_current_panel() {
        let (mut puzzle, mut state) = started();
        let text = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "the box")
            .unwrap();
        assert!(text.contains("MAIN PDU"));
        let _ = interact(&mut puzzle, &mut state, "open");
        let text = puzzle
            .handle_interaction(&mut state, ActionType::Examine, "")
            .unwrap();
        assert!(text.contains("loose RED wire"));
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Examine, "ceiling")
                .is_none()
        );
    }

    #[test]
    fn unrelated_interactions_match_nothing() {
        let (mut puzzle, mut state) = started();
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Interact, "coffee machine")
                .is_none()
        );
        assert!(
            puzzle
                .handle_interaction(&mut state, ActionType::Move, "box")
                .is_none()
        );
    }
}
