//! Player command path: free text in, survivor reply out.
//!
//! The engine never parses text itself. An [`IntentSource`] turns the
//! player's words into a structured [`Intent`] (or vetoes them), and a
//! [`DialogueSource`] voices the survivor's reply. Both may be slow network
//! calls, so [`handle_command`] holds the engine lock only for the short
//! read and write phases:
//!
//! 1. lock, snapshot a [`CommandContext`], unlock
//! 2. analyze the input (no lock)
//! 3. lock, apply the intent, snapshot sensory text and telemetry, unlock
//! 4. voice the reply (no lock)
//!
//! The safety check in step 2 sees the snapshot from step 1; a tick may
//! land in between and that staleness is accepted. The reply is built from
//! the snapshot taken right after the mutation in step 3.
//!
//! Collaborator failures never reach this module as errors. Sources map
//! them to [`Intent::unknown`] or fallback text.

use std::future::Future;

use habitat_types::{Intent, Telemetry};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::SharedEngine;

/// Read-only view of the habitat handed to the intent source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandContext {
    /// Rounded readings.
    pub telemetry: Telemetry,
    /// Current sensory description.
    pub sensory: String,
    /// Where the survivor is.
    pub location: String,
    /// Active scenario id, if any.
    pub scenario: Option<String>,
}

/// What the intent source made of the player's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentAnalysis {
    /// The input is safe to act on.
    Safe(Intent),
    /// The input was refused.
    Vetoed {
        /// Why it was refused.
        reason: String,
    },
}

/// Turns player text into structured intents.
pub trait IntentSource: Send + Sync {
    /// Classify `input` against the current `context`.
    fn analyze(
        &self,
        input: &str,
        context: &CommandContext,
    ) -> impl Future<Output = IntentAnalysis> + Send;
}

/// Everything the dialogue source needs to voice a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialoguePrompt {
    /// What the player said.
    pub player_input: String,
    /// How it was classified.
    pub intent: Intent,
    /// Scripted outcome from the scenario, if any.
    pub narrative: Option<String>,
    /// Sensory description after the intent was applied.
    pub sensory: String,
    /// Readings after the intent was applied.
    pub telemetry: Telemetry,
}

/// Produces the survivor's spoken reply.
pub trait DialogueSource: Send + Sync {
    /// Voice a reply to `prompt`.
    fn speak(&self, prompt: &DialoguePrompt) -> impl Future<Output = String> + Send;
}

/// Result of handling one player command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResponse {
    /// The survivor answered.
    Reply {
        /// The survivor's words.
        text: String,
        /// How the input was classified.
        intent: Intent,
        /// Scripted outcome, if the scenario reacted.
        narrative: Option<String>,
        /// Readings after the command.
        telemetry: Telemetry,
    },
    /// The safety interlock refused the command.
    Intercept {
        /// Message shown to the player.
        text: String,
        /// Why the command was refused.
        reason: String,
        /// Readings when the command was refused.
        telemetry: Telemetry,
    },
}

impl CommandResponse {
    /// Text shown to the player.
    pub fn text(&self) -> &str {
        match self {
            Self::Reply { text, .. } | Self::Intercept { text, .. } => text,
        }
    }

    /// Readings that accompany the response.
    pub const fn telemetry(&self) -> &Telemetry {
        match self {
            Self::Reply { telemetry, .. } | Self::Intercept { telemetry, .. } => telemetry,
        }
    }

    /// Whether the command was refused.
    pub const fn is_intercept(&self) -> bool {
        matches!(self, Self::Intercept { .. })
    }
}

/// Handle one line of player input.
pub async fn handle_command<I, D>(
    engine: &SharedEngine,
    intents: &I,
    dialogue: &D,
    input: &str,
) -> CommandResponse
where
    I: IntentSource,
    D: DialogueSource,
{
    let context = {
        let guard = engine.lock().await;
        CommandContext {
            telemetry: guard.telemetry(),
            sensory: guard.sensory(),
            location: guard.state().survivor.location.clone(),
            scenario: guard.active_scenario().map(str::to_owned),
        }
    };

    let intent = match intents.analyze(input, &context).await {
        IntentAnalysis::Safe(intent) => intent,
        IntentAnalysis::Vetoed { reason } => {
            info!(input, %reason, "Command intercepted by safety interlock");
            return CommandResponse::Intercept {
                text: format!("[SAFETY INTERLOCK]: {reason}"),
                reason,
                telemetry: context.telemetry,
            };
        }
    };

    let (narrative, sensory, telemetry) = {
        let mut guard = engine.lock().await;
        let narrative = guard.apply_intent(&intent);
        (narrative, guard.sensory(), guard.telemetry())
    };
    debug!(
        action = %intent.action,
        target = %intent.target,
        scripted = narrative.is_some(),
        "Intent applied"
    );

    let prompt = DialoguePrompt {
        player_input: input.to_owned(),
        intent,
        narrative,
        sensory,
        telemetry,
    };
    let text = dialogue.speak(&prompt).await;

    CommandResponse::Reply {
        text,
        intent: prompt.intent,
        narrative: prompt.narrative,
        telemetry: prompt.telemetry,
    }
}

/// An intent source that returns a fixed analysis.
#[derive(Debug, Clone)]
pub struct StubIntentSource {
    analysis: IntentAnalysis,
}

impl Default for StubIntentSource {
    fn default() -> Self {
        Self::new(IntentAnalysis::Safe(Intent::unknown()))
    }
}

impl StubIntentSource {
    /// Always answer with `analysis`.
    pub const fn new(analysis: IntentAnalysis) -> Self {
        Self { analysis }
    }

    /// Always answer with a safe `intent`.
    pub const fn safe(intent: Intent) -> Self {
        Self::new(IntentAnalysis::Safe(intent))
    }
}

impl IntentSource for StubIntentSource {
    async fn analyze(&self, _input: &str, _context: &CommandContext) -> IntentAnalysis {
        self.analysis.clone()
    }
}

/// A dialogue source that repeats the scripted narrative verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDialogue;

/// Reply used by [`EchoDialogue`] when the scenario had nothing to say.
pub const ECHO_FALLBACK: &str = "Copy that. Nothing happens.";

impl DialogueSource for EchoDialogue {
    async fn speak(&self, prompt: &DialoguePrompt) -> String {
        prompt
            .narrative
            .clone()
            .unwrap_or_else(|| ECHO_FALLBACK.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use habitat_types::ActionType;

    use super::*;
    use crate::engine::Engine;
    use crate::runner::{LoopControl, NoOpCallback, run_tick_loop};

    fn crisis_engine() -> SharedEngine {
        let mut engine = Engine::new();
        engine.load_scenario("co2_crisis").unwrap();
        engine.into_shared()
    }

    #[tokio::test]
    async fn safe_command_mutates_and_reports_fresh_telemetry() {
        let engine = crisis_engine();
        let intents = StubIntentSource::safe(Intent::new(ActionType::Examine, "shelf"));

        let response = handle_command(&engine, &intents, &EchoDialogue, "search the shelf").await;

        assert!(!response.is_intercept());
        assert!(response.text().contains("duct tape"));
        assert_eq!(response.telemetry().inventory.len(), 2);
        assert_eq!(engine.lock().await.state().survivor.inventory.len(), 2);
    }

    #[tokio::test]
    async fn vetoed_command_does_not_touch_state() {
        let engine = crisis_engine();
        let before = engine.lock().await.snapshot();
        let intents = StubIntentSource::new(IntentAnalysis::Vetoed {
            reason: String::from("Critical hazard detected: 'open airlock'"),
        });

        let response = handle_command(&engine, &intents, &EchoDialogue, "open airlock").await;

        assert!(response.is_intercept());
        assert_eq!(
            response.text(),
            "[SAFETY INTERLOCK]: Critical hazard detected: 'open airlock'"
        );
        assert_eq!(engine.lock().await.snapshot(), before);
    }

    #[tokio::test]
    async fn unknown_intent_gets_fallback_reply() {
        let engine = crisis_engine();
        let response =
            handle_command(&engine, &StubIntentSource::default(), &EchoDialogue, "hmm").await;
        assert_eq!(response.text(), ECHO_FALLBACK);
        assert!(matches!(
            response,
            CommandResponse::Reply {
                narrative: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn commands_interleave_safely_with_the_tick_loop() {
        let engine = crisis_engine();
        let control = Arc::new(LoopControl::new(0, 1.0, 200));

        let loop_engine = Arc::clone(&engine);
        let loop_control = Arc::clone(&control);
        let ticker = tokio::spawn(async move {
            let mut cb = NoOpCallback;
            run_tick_loop(&loop_engine, &loop_control, &mut cb).await
        });

        for target in ["shelf", "locker"] {
            let intents = StubIntentSource::safe(Intent::new(ActionType::Examine, target));
            let _ = handle_command(&engine, &intents, &EchoDialogue, target).await;
        }
        let fix = StubIntentSource::safe(Intent::new(ActionType::UseItem, "scrubber"));
        let response = handle_command(&engine, &fix, &EchoDialogue, "fix it").await;
        assert!(response.text().contains("CO2 levels dropping"));

        let result = ticker.await.unwrap();
        assert_eq!(result.total_ticks, 200);
        let guard = engine.lock().await;
        assert!(guard.scenario_solved());
        assert_eq!(guard.state().metadata.tick_count, 200);
        assert_eq!(guard.state().survivor.inventory.len(), 3);
    }

    #[test]
    fn response_serializes_with_kind_tag() {
        let response = CommandResponse::Intercept {
            text: String::from("[SAFETY INTERLOCK]: no"),
            reason: String::from("no"),
            telemetry: Engine::new().telemetry(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "intercept");
        assert_eq!(json["reason"], "no");
    }
}
